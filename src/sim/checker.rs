// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Runtime AXI4-Stream protocol checker.
//!
//! One [`StreamChecker`] watches one port. It is fed a sample per
//! evaluation step and flags the handshake rules a sender must keep:
//! once `valid` is up it stays up, with an unchanged payload, until `ready`
//! takes the beat; and nothing is offered while the port is in reset.

use crate::dut::StreamBeat;

/// Violation details kept per checker. Later ones are only counted.
pub const MAX_VIOLATION_DETAILS: usize = 10;

/// Protocol rule that was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// data/last/user changed while a stalled beat was pending.
    PayloadChangedDuringStall,
    /// valid dropped before the pending beat was accepted.
    ValidDroppedBeforeReady,
    /// valid asserted while reset was active.
    ValidDuringReset,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::PayloadChangedDuringStall => write!(f, "payload changed during back-pressure"),
            ViolationKind::ValidDroppedBeforeReady => write!(f, "valid deasserted before handshake"),
            ViolationKind::ValidDuringReset => write!(f, "valid asserted during reset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub cycle: u64,
    pub kind: ViolationKind,
}

/// What the simulation loop should do after a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimControl {
    Continue,
    Terminate,
}

/// Action to take when a rule is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationAction {
    /// Log the violation and continue
    #[default]
    Log,
    /// Stop the simulation loop
    Terminate,
}

/// How violations are handled.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub on_violation: ViolationAction,
    /// Stop after this many violations on one port (None = unlimited)
    pub max_violations: Option<u32>,
}

/// Counters collected by a checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerStats {
    pub transfers: u64,
    pub stalls: u64,
    pub violations: u32,
    pub details: Vec<Violation>,
}

pub struct StreamChecker {
    port: &'static str,
    config: CheckerConfig,
    stats: CheckerStats,
    /// Beat left pending by a stall in the previous sample.
    stalled: Option<StreamBeat>,
}

impl StreamChecker {
    pub fn new(port: &'static str, config: CheckerConfig) -> Self {
        StreamChecker {
            port,
            config,
            stats: CheckerStats::default(),
            stalled: None,
        }
    }

    pub fn stats(&self) -> &CheckerStats {
        &self.stats
    }

    /// Sample taken while the port is held in reset.
    pub fn observe_reset(&mut self, cycle: u64, valid: bool) -> SimControl {
        self.stalled = None;
        if valid {
            return self.violation(cycle, ViolationKind::ValidDuringReset);
        }
        SimControl::Continue
    }

    /// Sample one evaluation step of a running port.
    pub fn observe(&mut self, cycle: u64, valid: bool, ready: bool, beat: StreamBeat) -> SimControl {
        let mut control = SimControl::Continue;
        if let Some(pending) = self.stalled.take() {
            if !valid {
                control = self.violation(cycle, ViolationKind::ValidDroppedBeforeReady);
            } else if beat != pending {
                control = self.violation(cycle, ViolationKind::PayloadChangedDuringStall);
            }
        }

        if valid && ready {
            self.stats.transfers += 1;
        } else if valid {
            self.stats.stalls += 1;
            self.stalled = Some(beat);
        }
        control
    }

    fn violation(&mut self, cycle: u64, kind: ViolationKind) -> SimControl {
        clilog::warn!("[cycle {}] {}: {}", cycle, self.port, kind);
        self.stats.violations += 1;
        if self.stats.details.len() < MAX_VIOLATION_DETAILS {
            self.stats.details.push(Violation { cycle, kind });
        }

        if self.config.on_violation == ViolationAction::Terminate {
            return SimControl::Terminate;
        }
        if let Some(max) = self.config.max_violations {
            if self.stats.violations >= max {
                clilog::error!(
                    "Maximum protocol violations ({}) reached on {}, terminating",
                    max,
                    self.port
                );
                return SimControl::Terminate;
            }
        }
        SimControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(tdata: u32) -> StreamBeat {
        StreamBeat {
            tdata,
            tlast: false,
            tuser: 0,
        }
    }

    #[test]
    fn test_counts_transfers_and_stalls() {
        let mut chk = StreamChecker::new("s_axis", CheckerConfig::default());
        chk.observe(0, true, false, beat(1));
        chk.observe(1, true, true, beat(1));
        chk.observe(2, false, true, beat(0));
        chk.observe(3, true, true, beat(2));
        assert_eq!(chk.stats().transfers, 2);
        assert_eq!(chk.stats().stalls, 1);
        assert_eq!(chk.stats().violations, 0);
    }

    #[test]
    fn test_payload_change_during_stall() {
        let mut chk = StreamChecker::new("s_axis", CheckerConfig::default());
        chk.observe(0, true, false, beat(1));
        let control = chk.observe(1, true, true, beat(2));
        assert_eq!(control, SimControl::Continue);
        assert_eq!(chk.stats().violations, 1);
        assert_eq!(chk.stats().details[0].kind, ViolationKind::PayloadChangedDuringStall);
        assert_eq!(chk.stats().details[0].cycle, 1);
    }

    #[test]
    fn test_new_beat_after_transfer_is_legal() {
        let mut chk = StreamChecker::new("s_axis", CheckerConfig::default());
        chk.observe(0, true, true, beat(1));
        chk.observe(1, true, false, beat(2));
        chk.observe(2, true, true, beat(2));
        assert_eq!(chk.stats().violations, 0);
    }

    #[test]
    fn test_valid_dropped_and_reset() {
        let mut chk = StreamChecker::new("m_axis", CheckerConfig::default());
        chk.observe(0, true, false, beat(1));
        chk.observe(1, false, false, beat(1));
        chk.observe_reset(2, true);
        let kinds: Vec<_> = chk.stats().details.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::ValidDroppedBeforeReady, ViolationKind::ValidDuringReset]
        );
    }

    #[test]
    fn test_terminate_policy() {
        let config = CheckerConfig {
            on_violation: ViolationAction::Log,
            max_violations: Some(2),
        };
        let mut chk = StreamChecker::new("s_axis", config);
        assert_eq!(chk.observe_reset(0, true), SimControl::Continue);
        assert_eq!(chk.observe_reset(1, true), SimControl::Terminate);

        let config = CheckerConfig {
            on_violation: ViolationAction::Terminate,
            max_violations: None,
        };
        let mut chk = StreamChecker::new("s_axis", config);
        assert_eq!(chk.observe_reset(0, true), SimControl::Terminate);
    }

    #[test]
    fn test_details_are_capped() {
        let mut chk = StreamChecker::new("s_axis", CheckerConfig::default());
        for cycle in 0..(MAX_VIOLATION_DETAILS as u64 + 5) {
            chk.observe_reset(cycle, true);
        }
        assert_eq!(chk.stats().violations as usize, MAX_VIOLATION_DETAILS + 5);
        assert_eq!(chk.stats().details.len(), MAX_VIOLATION_DETAILS);
    }
}
