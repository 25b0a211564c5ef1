/// Summary of one [`BatchScheduler::run`](crate::BatchScheduler::run) drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	/// Slices started by this drive.
	pub slices: u64,
	/// Tasks executed successfully by this drive.
	pub executed: u64,
}
