// Nested calls allowed before a call fails with "Stack overflow."
pub(crate) const MAX_CALL_DEPTH: usize = 1024;

// Each call checks that this much native stack is left and grows it by
// `STACK_GROWTH_SIZE` otherwise. One interpreted call takes a few tens of
// kilobytes in debug builds.
pub(crate) const STACK_RED_ZONE: usize = 256 * 1024;
pub(crate) const STACK_GROWTH_SIZE: usize = 1024 * 1024;
