use rust_fsm::*;

/// Phase of a multiplayer race room as seen by one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Waiting,
    Countdown,
    Racing,
    Finished,
}

/// Inputs that can move a room between phases.
///
/// `GameStart` and `GameOver` arrive from the broker; `CountdownElapsed`
/// is raised locally 3 seconds after `game_start` was received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseInput {
    GameStart,
    CountdownElapsed,
    GameOver,
}

/// Transition table for [`GamePhase`]. A client never forces the race to
/// start on its own; every input here originates from an inbound event or
/// the one scheduled countdown-to-racing step.
pub struct PhaseMachine;

impl StateMachineImpl for PhaseMachine {
    type Input = PhaseInput;
    type State = GamePhase;
    type Output = ();
    const INITIAL_STATE: Self::State = GamePhase::Waiting;

    fn transition(state: &Self::State, input: &Self::Input) -> Option<Self::State> {
        match (state, input) {
            (GamePhase::Waiting, PhaseInput::GameStart) => Some(GamePhase::Countdown),
            (GamePhase::Countdown, PhaseInput::CountdownElapsed) => Some(GamePhase::Racing),
            // The broker's final snapshot is authoritative no matter how far
            // this client thought the race had progressed.
            (GamePhase::Waiting, PhaseInput::GameOver)
            | (GamePhase::Countdown, PhaseInput::GameOver)
            | (GamePhase::Racing, PhaseInput::GameOver) => Some(GamePhase::Finished),
            _ => None,
        }
    }

    fn output(_state: &Self::State, _input: &Self::Input) -> Option<Self::Output> {
        None
    }
}
