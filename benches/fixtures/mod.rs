// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write as _;
use std::time::Duration;

use criterion::Criterion;

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<usize>().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<u64>().ok()).unwrap_or(default)
}

pub fn criterion() -> Criterion {
    let sample_size = env_usize("BENCH_SAMPLE_SIZE", 60).clamp(10, 200);
    let warmup_secs = env_u64("BENCH_WARMUP_SECS", 3).clamp(1, 60);
    let measurement_secs = env_u64("BENCH_MEASUREMENT_SECS", 5).clamp(1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub containers: usize,
    pub children_per_container: usize,
    /// Connections per child, to children of the next container.
    pub fanout: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub const ALL: [Case; 3] = [Case::Small, Case::Medium, Case::Large];

    pub fn id(self) -> &'static str {
        match self {
            Case::Small => "small",
            Case::Medium => "medium",
            Case::Large => "large",
        }
    }

    pub fn params(self) -> Params {
        match self {
            Case::Small => Params { containers: 4, children_per_container: 4, fanout: 1 },
            Case::Medium => Params { containers: 12, children_per_container: 8, fanout: 2 },
            Case::Large => Params { containers: 30, children_per_container: 12, fanout: 3 },
        }
    }
}

pub fn container_id(idx: usize) -> String {
    format!("group_{idx:03}")
}

pub fn child_id(container: usize, child: usize) -> String {
    format!("{}.node_{child:03}", container_id(container))
}

/// Diagram text with `containers` blocks of children, each child wired to the next block.
pub fn text(params: Params) -> String {
    let mut out = String::new();
    for c in 0..params.containers {
        let _ = writeln!(out, "{}: Group {c} {{", container_id(c));
        for n in 0..params.children_per_container {
            let _ = writeln!(out, "  node_{n:03}: Node {c}-{n}");
        }
        let _ = writeln!(out, "}}");
    }
    for c in 0..params.containers.saturating_sub(1) {
        for n in 0..params.children_per_container {
            for k in 0..params.fanout {
                let target = (n + k) % params.children_per_container;
                let _ = writeln!(out, "{} -> {}", child_id(c, n), child_id(c + 1, target));
            }
        }
    }
    out
}

pub fn fixture(case: Case) -> String {
    text(case.params())
}
