//! Ports: the seams between the application services and the outside
//! world (storage, transactions, delivery, time, id generation).

pub mod clock;
pub mod id_generator;
pub mod notification;
pub mod repositories;
pub mod transaction;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification::NotificationSender;
pub use self::repositories::{
    ExerciseRepository, Repositories, TasksRepository, UserInfoRepository, UserParamsRepository, UserWeightRepository,
    WorkoutsRepository,
};
pub use self::transaction::{TransactionManager, TxFuture};
