//! Menu State Machine
//!
//! Defines the states of the interactive menu and the valid transitions
//! between them. Input parsing lives here too so that the mapping from a
//! typed line to a transition can be tested without a terminal.

/// Where the menu currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// Print the device list
    Listing,
    /// Wait for a selection
    Selecting,
    /// Connect to the device with this 1-based number
    Connecting(usize),
    /// Connecting failed; offer recovery for this device
    Recovery(usize),
    /// Print status for every device
    StatusAll,
    /// Leave the program
    Quit,
}

/// A parsed main-menu selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 1-based device number, already checked against the list length
    Device(usize),
    StatusAll,
    Quit,
    Invalid,
}

/// A choice in the recovery menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    Retry,
    RemoveAndPair,
    ShowStatus,
    Back,
}

impl RecoveryChoice {
    /// Menu lines in display order
    pub const MENU: [(u8, &'static str); 4] = [
        (1, "Retry connection"),
        (2, "Remove and re-pair"),
        (3, "Show device status"),
        (4, "Back to menu"),
    ];
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    /// The device list was printed
    Shown,
    /// The user made a selection
    Selected(Selection),
    /// Connect reported success
    ConnectSucceeded,
    /// Connect reported failure
    ConnectFailed,
    /// The recovery choice (if any) has been handled
    RecoveryDone,
    /// Status for all devices has been printed
    StatusShown,
    /// Standard input was closed
    InputClosed,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Success(MenuState),
    /// Transition was invalid from current state
    Invalid { from: MenuState, event: MenuEvent },
}

/// The menu state machine
#[derive(Debug)]
pub struct MenuStateMachine {
    current_state: MenuState,
    device_count: usize,
}

impl MenuStateMachine {
    /// Create a state machine in `Listing` for a list of `device_count` devices
    pub fn new(device_count: usize) -> Self {
        Self {
            current_state: MenuState::Listing,
            device_count,
        }
    }

    /// Get current state
    pub fn state(&self) -> MenuState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: MenuEvent) -> TransitionResult {
        // Closing stdin ends the session from anywhere
        if event == MenuEvent::InputClosed {
            self.current_state = MenuState::Quit;
            return TransitionResult::Success(MenuState::Quit);
        }

        match self.get_next_state(&event) {
            Some(state) => {
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn get_next_state(&self, event: &MenuEvent) -> Option<MenuState> {
        use MenuEvent::*;
        use MenuState::*;

        match (self.current_state, event) {
            (Listing, Shown) => Some(Selecting),

            (Selecting, Selected(Selection::Device(n))) if (1..=self.device_count).contains(n) => {
                Some(Connecting(*n))
            }
            (Selecting, Selected(Selection::StatusAll)) => Some(StatusAll),
            (Selecting, Selected(Selection::Quit)) => Some(Quit),
            // Invalid or out-of-range input goes back to the list untouched
            (Selecting, Selected(_)) => Some(Listing),

            (Connecting(_), ConnectSucceeded) => Some(Listing),
            (Connecting(n), ConnectFailed) => Some(Recovery(n)),

            (Recovery(_), RecoveryDone) => Some(Listing),

            (StatusAll, StatusShown) => Some(Listing),

            _ => None,
        }
    }
}

/// Parse a main-menu line against a list of `device_count` devices
pub fn parse_selection(input: &str, device_count: usize) -> Selection {
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }
    if input.eq_ignore_ascii_case("s") {
        return Selection::StatusAll;
    }

    match input.parse::<usize>() {
        Ok(n) if (1..=device_count).contains(&n) => Selection::Device(n),
        _ => Selection::Invalid,
    }
}

/// Parse a recovery-menu line
pub fn parse_recovery(input: &str) -> Option<RecoveryChoice> {
    match input.trim() {
        "1" => Some(RecoveryChoice::Retry),
        "2" => Some(RecoveryChoice::RemoveAndPair),
        "3" => Some(RecoveryChoice::ShowStatus),
        "4" => Some(RecoveryChoice::Back),
        _ => None,
    }
}
