pub mod daily_record;
pub mod rankings;
pub mod reaction_event;

pub use daily_record::DailyReactionRecord;
pub use rankings::{EmojiUsage, ReactionRanking, ReactionTally, UserRanking, UserTally};
pub use reaction_event::{CounterDelta, ReactionEvent, ReactionKind};
