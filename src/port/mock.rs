//! Scripted console for tests.
//!
//! `MockConsole` replays board output in chunks, the way a real UART hands it
//! over, and returns an idle timeout once the script runs dry.

use super::error::PortError;
use super::traits::ConsolePort;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockConsoleState {
    /// Chunks returned by successive reads; a chunk larger than the caller's
    /// buffer is split.
    chunks: VecDeque<Vec<u8>>,
    /// Everything written to the board.
    write_log: Vec<Vec<u8>>,
    /// Number of reads that found nothing.
    idle_reads: usize,
    cleared: bool,
    read_timeout: Duration,
}

/// Mock board console.
///
/// # Example
/// ```
/// use fpga_testkit::port::{ConsolePort, MockConsole};
///
/// let mut console = MockConsole::new("MOCK0");
/// console.push_output(b"Starting tests...\n");
///
/// let mut buffer = [0u8; 64];
/// let n = console.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Starting tests...\n");
/// assert!(console.read_bytes(&mut buffer).unwrap_err().is_idle());
/// ```
#[derive(Clone)]
pub struct MockConsole {
    name: String,
    state: Arc<Mutex<MockConsoleState>>,
}

impl MockConsole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockConsoleState {
                read_timeout: Duration::from_millis(100),
                ..Default::default()
            })),
        }
    }

    /// Queue one chunk of board output.
    pub fn push_output(&mut self, data: &[u8]) {
        self.state.lock().chunks.push_back(data.to_vec());
    }

    /// Queue each line as its own chunk, terminated with `\r\n`.
    pub fn push_lines(&mut self, lines: &[&str]) {
        let mut state = self.state.lock();
        for line in lines {
            state.chunks.push_back(format!("{}\r\n", line).into_bytes());
        }
    }

    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    pub fn idle_reads(&self) -> usize {
        self.state.lock().idle_reads
    }

    pub fn was_cleared(&self) -> bool {
        self.state.lock().cleared
    }

    pub fn pending_chunks(&self) -> usize {
        self.state.lock().chunks.len()
    }
}

impl ConsolePort for MockConsole {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        let Some(mut chunk) = state.chunks.pop_front() else {
            state.idle_reads += 1;
            return Err(PortError::timeout(state.read_timeout));
        };

        let n = chunk.len().min(buffer.len());
        buffer[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            let rest = chunk.split_off(n);
            state.chunks.push_front(rest);
        }
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.state.lock().write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        // Scripted output is what the board sends after the clear, so keep it.
        self.state.lock().cleared = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConsole")
            .field("name", &self.name)
            .field("pending_chunks", &self.pending_chunks())
            .finish()
    }
}
