//! 仓储层
//!
//! 所有对 PostgreSQL 的访问都收敛在这里。对账管道只依赖 `LedgerStore`
//! 抽象，HTTP 处理器直接使用具体仓储。

pub mod balance_repo;
pub mod order_repo;
pub mod traits;
pub mod user_repo;

pub use balance_repo::BalanceRepository;
pub use order_repo::{OrderRepository, OrderSubmission};
pub use traits::LedgerStore;
pub use user_repo::UserRepository;
