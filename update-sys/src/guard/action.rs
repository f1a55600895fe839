// SPDX-License-Identifier: GPL-3.0-only

use tracing::debug;
use update_contracts::ActionProcessor;
use update_types::{ActionExitCode, code_to_string};

use super::{Guard, Release};

/// Reports an action's pending result code to its processor.
pub struct CompleteAction<'a, P: ActionProcessor> {
    processor: &'a mut P,
    action: Option<P::Action>,
    code: ActionExitCode,
}

/// Completes an action with `Error` unless told otherwise through
/// [`ActionCompleter::set_code`].
pub type ActionCompleter<'a, P> = Guard<CompleteAction<'a, P>>;

impl<P: ActionProcessor> CompleteAction<'_, P> {
    pub fn code(&self) -> ActionExitCode {
        self.code
    }
}

impl<P: ActionProcessor> Release for CompleteAction<'_, P> {
    fn release(&mut self) {
        if let Some(action) = self.action.take() {
            debug!("Completing action with {}", code_to_string(self.code));
            self.processor.action_complete(action, self.code);
        }
    }
}

impl<'a, P: ActionProcessor> Guard<CompleteAction<'a, P>> {
    pub fn new(processor: &'a mut P, action: P::Action) -> Self {
        Self::armed(CompleteAction {
            processor,
            action: Some(action),
            code: ActionExitCode::default(),
        })
    }

    pub fn set_code(&mut self, code: impl Into<ActionExitCode>) {
        self.resource_mut().code = code.into();
    }

    pub fn code(&self) -> ActionExitCode {
        self.resource().code()
    }
}

#[cfg(test)]
mod tests {
    use update_types::{ErrorCode, ExitFlag};

    use super::*;

    #[derive(Default)]
    struct RecordingProcessor {
        completed: Vec<(&'static str, ActionExitCode)>,
    }

    impl ActionProcessor for RecordingProcessor {
        type Action = &'static str;

        fn action_complete(&mut self, action: Self::Action, code: ActionExitCode) {
            self.completed.push((action, code));
        }
    }

    fn run_action(processor: &mut RecordingProcessor, succeed: bool) {
        let mut completer = ActionCompleter::new(processor, "filesystem_copier");
        if !succeed {
            return;
        }
        completer.set_code(ErrorCode::Success);
    }

    #[test]
    fn reports_mutated_code_exactly_once() {
        let mut processor = RecordingProcessor::default();
        {
            let mut completer = ActionCompleter::new(&mut processor, "download");
            let code = ActionExitCode::new(ErrorCode::DownloadWriteError)
                .with_flags(ExitFlag::Resumed);
            completer.set_code(code);
            assert_eq!(completer.code(), code);
        }

        assert_eq!(
            processor.completed,
            vec![(
                "download",
                ActionExitCode::new(ErrorCode::DownloadWriteError).with_flags(ExitFlag::Resumed)
            )]
        );
    }

    #[test]
    fn early_return_reports_default_error() {
        let mut processor = RecordingProcessor::default();
        run_action(&mut processor, false);
        run_action(&mut processor, true);

        assert_eq!(
            processor.completed,
            vec![
                ("filesystem_copier", ActionExitCode::from(ErrorCode::Error)),
                ("filesystem_copier", ActionExitCode::from(ErrorCode::Success)),
            ]
        );
    }

    #[test]
    fn disarmed_completer_reports_nothing() {
        let mut processor = RecordingProcessor::default();
        {
            let mut completer = ActionCompleter::new(&mut processor, "postinstall");
            completer.set_code(ErrorCode::Success);
            completer.disarm();
        }
        assert!(processor.completed.is_empty());
    }

    #[test]
    fn explicit_release_is_not_repeated_on_drop() {
        let mut processor = RecordingProcessor::default();
        {
            let mut completer = ActionCompleter::new(&mut processor, "omaha_request");
            completer.release_now();
        }
        assert_eq!(processor.completed.len(), 1);
    }
}
