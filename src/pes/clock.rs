//! Three-clock-domain timestamp recovery (spec §3, §4.D).
//!
//! A decoded subtitle needs a single millisecond timestamp, but the
//! transport only ever offers a 90 kHz PTS (when the PES header
//! carries one) or, failing that, the most recent 27 MHz PCR seen on
//! any PID (see [`crate::ts::demux::TsDemuxer::pcr_ms`]). Once either
//! source is chosen for the first PES of a session, the choice is
//! sticky for the lifetime of the run — mixing sources mid-stream
//! would make every frame's timestamp the C original was measured
//! against unreproducible, so this crate reproduces the same
//! sticky-choice behaviour.

/// Tracks the sticky PTS-vs-PCR decision, the one-shot wall-clock
/// `delta`, and wraparound state across the run.
#[derive(Debug, Clone, Copy)]
pub struct ClockState {
    using_pts: Option<bool>,
    delta: Option<i64>,
    t0: Option<u64>,
    last_timestamp: u64,
    /// Wall-clock reference, in whole seconds since the Unix epoch.
    /// Seeded at startup; may be overridden by an 8/30 service-data
    /// packet (see [`crate::teletext::service`]).
    utc_refvalue: u64,
}

impl ClockState {
    /// Creates clock state seeded from `utc_refvalue` (Unix seconds),
    /// normally the wall clock read once at process startup.
    pub fn new(utc_refvalue: u64) -> Self {
        Self {
            using_pts: None,
            delta: None,
            t0: None,
            last_timestamp: 0,
            utc_refvalue,
        }
    }

    /// Overrides `utc_refvalue` (an 8/30 broadcast service-data packet
    /// arrived) and clears `delta` so the next PES re-anchors the
    /// clock, matching spec §3's "On detected... clear the
    /// PTS-initialised flag so `pes::clock::ClockState` re-anchors".
    pub fn reanchor(&mut self, utc_refvalue: u64) {
        self.utc_refvalue = utc_refvalue;
        self.delta = None;
    }

    /// Observes one PES's clock inputs and returns the published
    /// millisecond timestamp, or `None` if the clock cannot yet be
    /// initialised (PTS unused and no PCR has been seen yet).
    ///
    /// `pts_ms` is `Some` only when the PES carried a PTS; `pcr_ms` is
    /// the latest global PCR snapshot, if any has been observed.
    pub fn observe(&mut self, pts_ms: Option<u64>, pcr_ms: Option<u64>) -> Option<u64> {
        let using_pts = *self.using_pts.get_or_insert(pts_ms.is_some());

        let t_ms = if using_pts { pts_ms } else { pcr_ms }?;

        if self.delta.is_none() {
            self.delta = Some(1000i64 * self.utc_refvalue as i64 - t_ms as i64);
            self.t0 = Some(t_ms);
            self.last_timestamp = (t_ms as i64 + self.delta.unwrap()) as u64;
            return Some(self.last_timestamp);
        }

        if let Some(t0) = self.t0 {
            if t_ms < t0 {
                // Wraparound: freeze the outbound clock at its last
                // published value and resume counting from there.
                self.delta = Some(self.last_timestamp as i64);
            }
        }
        self.last_timestamp = (t_ms as i64 + self.delta.unwrap()) as u64;
        self.t0 = Some(t_ms);
        Some(self.last_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defers_initialisation_without_pcr_or_pts() {
        let mut clock = ClockState::new(1_700_000_000);
        assert_eq!(clock.observe(None, None), None);
    }

    #[test]
    fn initialises_from_pcr_when_no_pts() {
        let mut clock = ClockState::new(1_700_000_000);
        let t = clock.observe(None, Some(12_345)).unwrap();
        assert_eq!(t, 1000 * 1_700_000_000);
    }

    #[test]
    fn using_pts_is_sticky() {
        let mut clock = ClockState::new(1_700_000_000);
        clock.observe(Some(1_000), None).unwrap();
        // Second call has no PTS; since using_pts latched true on the
        // first call, this must defer rather than silently fall back
        // to PCR.
        assert_eq!(clock.observe(None, Some(999)), None);
    }

    #[test]
    fn advances_monotonically_with_pts() {
        let mut clock = ClockState::new(1_700_000_000);
        let t1 = clock.observe(Some(1_000), None).unwrap();
        let t2 = clock.observe(Some(2_000), None).unwrap();
        assert_eq!(t2 - t1, 1_000);
    }

    #[test]
    fn wraparound_freezes_and_resumes() {
        let mut clock = ClockState::new(1_700_000_000);
        let t1 = clock.observe(Some(5_000), None).unwrap();
        let wrapped = clock.observe(Some(100), None).unwrap();
        assert_eq!(wrapped, t1 + 100);
    }

    #[test]
    fn reanchor_forces_reinitialisation() {
        let mut clock = ClockState::new(1_700_000_000);
        clock.observe(Some(1_000), None).unwrap();
        clock.reanchor(1_800_000_000);
        let t = clock.observe(Some(1_000), None).unwrap();
        assert_eq!(t, 1000 * 1_800_000_000);
    }
}
