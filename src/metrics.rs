// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the gateway.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Gateway metrics, registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    auth_failures: IntCounterVec,
    inquiries: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("mcp_requests_total", "Requests handled, by route and status"),
            &["route", "status"],
        )?;
        let auth_failures = IntCounterVec::new(
            Opts::new("mcp_auth_failures_total", "Rejected request signatures, by reason"),
            &["reason"],
        )?;
        let inquiries = IntCounterVec::new(
            Opts::new("mcp_inquiries_total", "Inquiry submissions, by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(auth_failures.clone()))?;
        registry.register(Box::new(inquiries.clone()))?;

        Ok(Self {
            registry,
            requests,
            auth_failures,
            inquiries,
        })
    }

    pub fn record_request(&self, route: &str, status: u16) {
        self.requests
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    pub fn record_auth_failure(&self, reason: &str) {
        self.auth_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_inquiry(&self, outcome: &str) {
        self.inquiries.with_label_values(&[outcome]).inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
