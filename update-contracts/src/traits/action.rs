// SPDX-License-Identifier: GPL-3.0-only

use update_types::ActionExitCode;

/// The part of the action processor an action talks back to.
pub trait ActionProcessor {
    /// Handle identifying the action being completed.
    type Action;

    /// Mark `action` finished with `code`. Called at most once per action.
    fn action_complete(&mut self, action: Self::Action, code: ActionExitCode);
}
