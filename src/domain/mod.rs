mod cash;
mod history;
mod holding;
mod ledger;
mod money;
mod symbol;
mod trade;
mod user;

pub use cash::*;
pub use history::*;
pub use holding::*;
pub use ledger::*;
pub use money::*;
pub use symbol::*;
pub use trade::*;
pub use user::*;
