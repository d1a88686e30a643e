pub mod types;

pub use types::{AuditStatus, Concern, ConcernKey, Entry, Pos, Rank, RankedTerm, UnknownPos};
