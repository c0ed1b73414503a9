pub mod detect;
pub mod dump;
pub mod hardware;
pub mod instance;
pub mod platform;
pub mod xstate;
