//! Event classification and message rendering.
//!
//! [`Formatter::classify_and_format`] is the whole decision pipeline for one
//! webhook: policy check, empty-resource short-circuit, then one message per
//! resource in payload order. It performs no I/O.

use relay_core::{DeliveryTarget, OutboundMessage, ParseMode, RelayConfig};
use tracing::{debug, info, warn};

use crate::escape::Escaper;
use crate::kind::EventKind;
use crate::payload::{EventPayload, Resource, ScanDetail};
use crate::policy::EventPolicy;

/// Stand-in for any text field the payload does not provide.
pub const PLACEHOLDER: &str = "—";

/// Outcome of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Event type absent from the policy or switched off.
    Ignored,
    /// Enabled event carrying an empty resource list.
    NoResources,
    /// Enabled event type that has no message layout.
    Unsupported,
    /// Messages were produced, one per resource.
    Processed(usize),
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Ignored => "ignored",
            Decision::NoResources => "no_resources",
            Decision::Unsupported => "unsupported",
            Decision::Processed(_) => "processed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub decision: Decision,
    pub messages: Vec<OutboundMessage>,
}

impl Classification {
    fn empty(decision: Decision) -> Self {
        Self {
            decision,
            messages: Vec::new(),
        }
    }
}

/// Turns Harbor payloads into chat messages.
///
/// Holds only startup configuration; share it behind an `Arc` and call it
/// from any number of requests concurrently.
#[derive(Debug, Clone)]
pub struct Formatter {
    policy: EventPolicy,
    escaper: Escaper,
    target: DeliveryTarget,
    parse_mode: ParseMode,
}

/// Escaped fields shared by every resource of one event.
struct EventContext {
    operator: String,
    repository: String,
}

impl Formatter {
    pub fn new(
        policy: EventPolicy,
        escaper: Escaper,
        target: DeliveryTarget,
        parse_mode: ParseMode,
    ) -> Self {
        Self {
            policy,
            escaper,
            target,
            parse_mode,
        }
    }

    pub fn from_config(config: &RelayConfig) -> relay_core::Result<Self> {
        Ok(Self::new(
            EventPolicy::new(config.events.clone()),
            Escaper::new(config.format.escape_set()?),
            config.telegram.target(),
            config.telegram.parse_mode,
        ))
    }

    pub fn policy(&self) -> &EventPolicy {
        &self.policy
    }

    pub fn escaper(&self) -> &Escaper {
        &self.escaper
    }

    pub fn classify_and_format(&self, payload: &EventPayload) -> Classification {
        let kind = payload.kind();
        if !self.policy.allows(&kind) {
            debug!(event_type = %kind, "event type not enabled, ignoring");
            return Classification::empty(Decision::Ignored);
        }

        let ctx = EventContext {
            operator: self.escaper.escape(or_placeholder(payload.operator.as_deref())),
            repository: self.escaper.escape(or_placeholder(
                payload.event_data.repository.repo_full_name.as_deref(),
            )),
        };

        let resources = payload.resources();
        if resources.is_empty() {
            warn!(event_type = %kind, "no resources to process");
            return Classification::empty(Decision::NoResources);
        }

        let texts: Vec<String> = match &kind {
            EventKind::PushArtifact => resources
                .iter()
                .map(|r| self.render_artifact(&ctx, r, "📦 *New push*", "Pusher"))
                .collect(),
            EventKind::PullArtifact => resources
                .iter()
                .map(|r| self.render_artifact(&ctx, r, "📥 *Pull*", "User"))
                .collect(),
            EventKind::DeleteArtifact => resources
                .iter()
                .map(|r| self.render_artifact(&ctx, r, "🗑️ *Delete*", "User"))
                .collect(),
            EventKind::ScanningStopped => resources
                .iter()
                .map(|r| self.render_scan_stopped(&ctx, r))
                .collect(),
            EventKind::ScanningCompleted => resources
                .iter()
                .map(|r| self.render_scan_completed(&ctx, r))
                .collect(),
            EventKind::Other(tag) => {
                warn!(
                    event_type = %tag,
                    resources = resources.len(),
                    "event type is enabled but has no message layout, dropping"
                );
                return Classification::empty(Decision::Unsupported);
            }
        };

        let count = texts.len();
        info!(event_type = %kind, messages = count, "event formatted");

        let messages = texts
            .into_iter()
            .map(|text| OutboundMessage {
                text,
                target: self.target.clone(),
                parse_mode: self.parse_mode,
            })
            .collect();

        Classification {
            decision: Decision::Processed(count),
            messages,
        }
    }

    // ── Layouts ──────────────────────────────────────────────────────────────

    /// Header plus the Repository / Tag / URL block every layout starts with.
    fn resource_block(&self, header: &str, ctx: &EventContext, resource: &Resource) -> String {
        debug!(
            tag = resource.tag.as_deref().unwrap_or_default(),
            digest = resource.digest.as_deref().unwrap_or_default(),
            "rendering resource"
        );
        let tag = self.escaper.escape(or_placeholder(resource.tag.as_deref()));
        let url = or_placeholder(resource.resource_url.as_deref());
        format!(
            "{header}\n*Repository:* {repo}\n*Tag:* {tag}\n*URL:* `{url}`",
            repo = ctx.repository,
        )
    }

    fn render_artifact(
        &self,
        ctx: &EventContext,
        resource: &Resource,
        header: &str,
        actor_label: &str,
    ) -> String {
        let mut text = self.resource_block(header, ctx, resource);
        text.push_str(&format!("\n*{actor_label}:* {}", ctx.operator));
        text
    }

    fn render_scan_stopped(&self, ctx: &EventContext, resource: &Resource) -> String {
        let scan = resource.first_scan();
        let status = self.escaper.escape(or_placeholder(
            scan.and_then(|s| s.scan_status.as_deref()),
        ));
        let duration = scan.map(|s| s.duration).unwrap_or(0);

        let mut text = self.resource_block("🔍 *Scan stopped*", ctx, resource);
        text.push_str(&format!("\n*Scan Status:* {status}"));
        text.push_str(&format!("\n*Duration:* {duration}s"));
        text.push_str(&format!("\n*User:* {}", ctx.operator));
        text
    }

    fn render_scan_completed(&self, ctx: &EventContext, resource: &Resource) -> String {
        let scan = resource.first_scan();
        let severity = self.escaper.escape(or_placeholder(
            scan.and_then(|s| s.severity.as_deref()),
        ));
        let (total, fixable) = scan
            .map(|s| (s.summary.total, s.summary.fixable))
            .unwrap_or((0, 0));

        let mut text = self.resource_block("🔍 *Scan completed*", ctx, resource);
        text.push_str(&format!("\n*Max Severity:* {severity}"));
        text.push_str(&format!("\n*Total Vulnerabilities:* {total}"));
        text.push_str(&format!("\n*Fixable:* {fixable}"));

        if let Some(scan) = scan.filter(|s| !s.summary.summary.is_empty()) {
            text.push_str("\n*Breakdown:*");
            for (level, count) in &scan.summary.summary {
                text.push_str(&format!(
                    "\n• {}: {}",
                    self.escaper.escape(level),
                    self.escaper.escape_display(count)
                ));
            }
        }

        text.push_str(&format!("\n*Scanner:* {}", self.scanner_label(scan)));
        text.push_str(&format!("\n*User:* {}", ctx.operator));
        text
    }

    fn scanner_label(&self, scan: Option<&ScanDetail>) -> String {
        let Some(scanner) = scan.map(|s| &s.scanner) else {
            return PLACEHOLDER.to_string();
        };
        let name = self.escaper.escape(or_placeholder(scanner.name.as_deref()));
        match scanner.version.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(version) => format!("{name} {}", self.escaper.escape(version)),
            None => name,
        }
    }
}

/// Missing and blank values both render as [`PLACEHOLDER`].
fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::config::DEFAULT_ESCAPE_CHARS;
    use relay_core::ChatId;

    fn default_escaper() -> Escaper {
        Escaper::new(
            DEFAULT_ESCAPE_CHARS
                .iter()
                .filter_map(|s| s.chars().next())
                .collect(),
        )
    }

    fn formatter_with(tags: &[&str], escaper: Escaper) -> Formatter {
        Formatter::new(
            tags.iter().map(|t| (*t, true)).collect(),
            escaper,
            DeliveryTarget::new(ChatId::Id(-100500)).with_thread(7),
            ParseMode::MarkdownV2,
        )
    }

    fn formatter(tags: &[&str]) -> Formatter {
        formatter_with(tags, default_escaper())
    }

    fn payload(json: serde_json::Value) -> EventPayload {
        serde_json::from_value(json).unwrap()
    }

    fn push_payload() -> EventPayload {
        payload(serde_json::json!({
            "type": "PUSH_ARTIFACT",
            "operator": "alice",
            "event_data": {
                "repository": {"repo_full_name": "ns/app"},
                "resources": [{"tag": "v1.0", "resource_url": "https://reg/ns/app:v1.0"}]
            }
        }))
    }

    #[test]
    fn disabled_type_is_ignored() {
        let f = formatter(&["PULL_ARTIFACT"]);
        let out = f.classify_and_format(&push_payload());
        assert_eq!(out.decision, Decision::Ignored);
        assert!(out.messages.is_empty());
    }

    #[test]
    fn type_mapped_to_false_is_ignored() {
        let f = Formatter::new(
            [("PUSH_ARTIFACT", false)].into_iter().collect(),
            default_escaper(),
            DeliveryTarget::new(ChatId::Id(1)),
            ParseMode::MarkdownV2,
        );
        let out = f.classify_and_format(&push_payload());
        assert_eq!(out.decision, Decision::Ignored);
        assert!(out.messages.is_empty());
    }

    #[test]
    fn enabled_type_without_resources_short_circuits() {
        let f = formatter(&["SCANNING_COMPLETED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "SCANNING_COMPLETED",
            "operator": "bob",
            "event_data": {"repository": {"repo_full_name": "ns/app"}, "resources": []}
        })));
        assert_eq!(out.decision, Decision::NoResources);
        assert!(out.messages.is_empty());
    }

    #[test]
    fn push_renders_expected_layout() {
        let f = formatter(&["PUSH_ARTIFACT"]);
        let out = f.classify_and_format(&push_payload());
        assert_eq!(out.decision, Decision::Processed(1));
        assert_eq!(out.messages.len(), 1);
        assert_eq!(
            out.messages[0].text,
            "📦 *New push*\n\
             *Repository:* ns/app\n\
             *Tag:* v1\\.0\n\
             *URL:* `https://reg/ns/app:v1.0`\n\
             *Pusher:* alice"
        );
    }

    #[test]
    fn tag_left_alone_when_dot_not_in_escape_set() {
        let f = formatter_with(&["PUSH_ARTIFACT"], Escaper::new(vec!['_']));
        let out = f.classify_and_format(&push_payload());
        assert!(out.messages[0].text.contains("*Tag:* v1.0\n"));
    }

    #[test]
    fn messages_carry_target_and_parse_mode() {
        let f = formatter(&["PUSH_ARTIFACT"]);
        let msg = &f.classify_and_format(&push_payload()).messages[0];
        assert_eq!(msg.target.chat_id, ChatId::Id(-100500));
        assert_eq!(msg.target.message_thread_id, Some(7));
        assert_eq!(msg.parse_mode, ParseMode::MarkdownV2);
    }

    #[test]
    fn pull_and_delete_use_their_headers() {
        let f = formatter(&["PULL_ARTIFACT", "DELETE_ARTIFACT"]);
        let mut p = push_payload();

        p.event_type = "PULL_ARTIFACT".into();
        let pull = &f.classify_and_format(&p).messages[0].text;
        assert!(pull.starts_with("📥 *Pull*\n"));
        assert!(pull.ends_with("*User:* alice"));

        p.event_type = "DELETE_ARTIFACT".into();
        let delete = &f.classify_and_format(&p).messages[0].text;
        assert!(delete.starts_with("🗑️ *Delete*\n"));
        assert!(delete.ends_with("*User:* alice"));
    }

    #[test]
    fn one_message_per_resource_in_order() {
        let f = formatter(&["PUSH_ARTIFACT"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "PUSH_ARTIFACT",
            "operator": "ci_bot",
            "event_data": {
                "repository": {"repo_full_name": "team/api"},
                "resources": [{"tag": "a"}, {"tag": "b"}, {"tag": "c"}]
            }
        })));
        assert_eq!(out.decision, Decision::Processed(3));
        let tags: Vec<bool> = ["a", "b", "c"]
            .iter()
            .zip(&out.messages)
            .map(|(t, m)| m.text.contains(&format!("*Tag:* {t}\n")))
            .collect();
        assert_eq!(tags, [true, true, true]);
        // operator is escaped once and shared by every message
        assert!(out.messages.iter().all(|m| m.text.ends_with(r"*Pusher:* ci\_bot")));
    }

    #[test]
    fn missing_tag_and_url_use_placeholder() {
        let f = formatter(&["PUSH_ARTIFACT"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "PUSH_ARTIFACT",
            "event_data": {"resources": [{}]}
        })));
        let text = &out.messages[0].text;
        assert!(text.contains("*Tag:* —\n"));
        assert!(text.contains("*URL:* `—`"));
        assert!(text.contains("*Repository:* —\n"));
        assert!(text.ends_with("*Pusher:* —"));
    }

    #[test]
    fn url_is_not_escaped() {
        let f = formatter(&["PUSH_ARTIFACT"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "PUSH_ARTIFACT",
            "event_data": {"resources": [{"resource_url": "reg.io/my_ns/app-x:1.2"}]}
        })));
        assert!(out.messages[0].text.contains("`reg.io/my_ns/app-x:1.2`"));
    }

    #[test]
    fn scan_stopped_reads_first_scan_report() {
        let f = formatter(&["SCANNING_STOPPED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "SCANNING_STOPPED",
            "operator": "admin",
            "event_data": {
                "repository": {"repo_full_name": "library/redis"},
                "resources": [{
                    "tag": "7",
                    "resource_url": "reg/library/redis:7",
                    "scan_overview": {
                        "application/vnd.security.vulnerability.report; version=1.1": {
                            "scan_status": "Stopped",
                            "duration": 12
                        }
                    }
                }]
            }
        })));
        let text = &out.messages[0].text;
        assert!(text.starts_with("🔍 *Scan stopped*\n"));
        assert!(text.contains("*Scan Status:* Stopped\n"));
        assert!(text.contains("*Duration:* 12s\n"));
        assert!(text.ends_with("*User:* admin"));
    }

    #[test]
    fn scan_stopped_without_overview_degrades() {
        let f = formatter(&["SCANNING_STOPPED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "SCANNING_STOPPED",
            "event_data": {"resources": [{"tag": "7"}]}
        })));
        let text = &out.messages[0].text;
        assert!(text.contains("*Scan Status:* —\n"));
        assert!(text.contains("*Duration:* 0s\n"));
    }

    #[test]
    fn scan_completed_lists_breakdown_in_document_order() {
        let f = formatter(&["SCANNING_COMPLETED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "SCANNING_COMPLETED",
            "operator": "scanner-bot",
            "event_data": {
                "repository": {"repo_full_name": "ns/app"},
                "resources": [{
                    "tag": "v2",
                    "resource_url": "reg/ns/app:v2",
                    "scan_overview": {
                        "application/vnd.security.vulnerability.report; version=1.1": {
                            "scan_status": "Success",
                            "severity": "Critical",
                            "duration": 4,
                            "summary": {
                                "total": 7,
                                "fixable": 3,
                                "summary": {"Critical": 2, "High": 5}
                            },
                            "scanner": {"name": "Trivy", "vendor": "Aqua Security", "version": "v0.50.1"}
                        }
                    }
                }]
            }
        })));
        assert_eq!(out.decision, Decision::Processed(1));
        let text = &out.messages[0].text;
        assert!(text.starts_with("🔍 *Scan completed*\n"));
        assert!(text.contains("*Max Severity:* Critical\n"));
        assert!(text.contains("*Total Vulnerabilities:* 7\n"));
        assert!(text.contains("*Fixable:* 3\n"));
        assert!(text.contains("*Breakdown:*\n• Critical: 2\n• High: 5\n"));
        assert!(text.contains(r"*Scanner:* Trivy v0\.50\.1"));
        assert!(text.ends_with(r"*User:* scanner\-bot"));
    }

    #[test]
    fn scan_completed_without_report_degrades() {
        let f = formatter(&["SCANNING_COMPLETED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "SCANNING_COMPLETED",
            "event_data": {"resources": [{"tag": "v2"}]}
        })));
        let text = &out.messages[0].text;
        assert!(text.contains("*Max Severity:* —\n"));
        assert!(text.contains("*Total Vulnerabilities:* 0\n"));
        assert!(!text.contains("*Breakdown:*"));
        assert!(text.contains("*Scanner:* —\n"));
    }

    #[test]
    fn enabled_unknown_type_is_unsupported() {
        let f = formatter(&["QUOTA_EXCEED"]);
        let out = f.classify_and_format(&payload(serde_json::json!({
            "type": "QUOTA_EXCEED",
            "event_data": {"resources": [{"tag": "x"}]}
        })));
        assert_eq!(out.decision, Decision::Unsupported);
        assert!(out.messages.is_empty());
    }

    #[test]
    fn from_config_wires_policy_escaper_and_target() {
        let cfg = RelayConfig::from_toml_str(
            r#"
            [telegram]
            bot_token = "t"
            chat_id = "@builds"
            parse_mode = "Markdown"

            [format]
            escape_chars = ["_"]

            [events]
            PUSH_ARTIFACT = true
            "#,
        )
        .unwrap();
        let f = Formatter::from_config(&cfg).unwrap();
        assert!(f.policy().is_enabled("PUSH_ARTIFACT"));
        assert_eq!(f.escaper().chars(), ['_']);
        let msg = &f.classify_and_format(&push_payload()).messages[0];
        assert_eq!(msg.target.chat_id, ChatId::from("@builds"));
        assert_eq!(msg.parse_mode, ParseMode::Markdown);
        assert!(msg.text.contains("*Tag:* v1.0\n"));
    }
}
