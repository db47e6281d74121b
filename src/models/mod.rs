pub mod watch_rule;
pub mod grading_order;
pub mod notification;
pub mod market_item;

pub use watch_rule::{Direction, WatchRule};
pub use grading_order::{GradingOrder, GradingStatus, SpeedTier};
pub use notification::Notification;
pub use market_item::MarketItem;
