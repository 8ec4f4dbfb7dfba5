// End-to-end tests for the Quotecast control API
//
// Each test gets its own server on an ephemeral port, with its own scheduler
// task, wired the same way as the binary. Speech comes from an in-process
// repository (silent PCM, or a provider configured to fail) and audio goes
// through the real clocked sink, so sessions play in real time with short
// clips.
//
// Tests are independent and run in parallel.

mod test_session;
