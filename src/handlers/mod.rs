pub mod callback_handler;
pub mod command_handler;
pub mod payment_handler;

pub use callback_handler::CallbackHandler;
pub use command_handler::CommandHandler;
pub use payment_handler::PaymentHandler;
