mod controller;
mod worker;

pub use controller::ListenerController;
