/// Whether a run should actually deliver anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunType {
    /// Read from GitHub as usual, but only log what would be uploaded, published, or sent.
    DryRun,
    /// Actually do the thing.
    Real,
}
