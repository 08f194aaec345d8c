use derive_more::Display;

/// Where one item is in its acquisition.
///
/// `Pending → Downloading → (Converting →) Tagging → Done`; any stage that
/// is not yet finished can move to `Failed`.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum Stage {
    #[default]
    #[display("pending")]
    Pending,
    #[display("downloading")]
    Downloading,
    #[display("converting")]
    Converting,
    #[display("tagging")]
    Tagging,
    #[display("done")]
    Done,
    #[display("failed")]
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(&self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (current, Failed) => !current.is_terminal(),
            (Pending, Downloading)
            | (Downloading, Converting | Tagging)
            | (Converting, Tagging)
            | (Tagging, Done) => true,
            _ => false,
        }
    }
}

/// Follows one item through its stages, logging every transition.
#[derive(Debug)]
pub(crate) struct Progress<'a> {
    title: &'a str,
    stage: Stage,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(title: &'a str) -> Self {
        Self { title, stage: Stage::Pending }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: Stage) {
        debug_assert!(self.stage.can_advance_to(next), "illegal transition {} -> {next}", self.stage);
        tracing::debug!(title = self.title, from = %self.stage, to = %next, "Acquisition stage");
        self.stage = next;
    }
}
