pub mod fsm;
pub mod passages;
pub mod protocol;
pub mod wpm;
