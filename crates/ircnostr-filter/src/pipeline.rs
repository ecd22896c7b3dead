// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message relay decision.

use std::collections::BTreeSet;
use std::time::Duration;

use ircnostr_config::model::{FilterConfig, IrcConfig};
use ircnostr_core::types::{DecisionReason, IncomingMessage, OutboundPost, RelayDecision};
use tracing::debug;

use crate::limiter::SlidingWindowLimiter;
use crate::sanitize::sanitize;

/// Verdict for one message, with the post to publish when approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub decision: RelayDecision,
    pub post: Option<OutboundPost>,
}

impl FilterOutcome {
    fn rejected(reason: DecisionReason) -> Self {
        Self {
            decision: RelayDecision::reject(reason),
            post: None,
        }
    }
}

/// Sender match, channel match, rate limit, sanitize; first failure wins.
///
/// Owned by a single task; the limiter state lives here.
#[derive(Debug)]
pub struct RelayFilterPipeline {
    target_sender: String,
    target_channel: String,
    limiter: SlidingWindowLimiter,
    tags: BTreeSet<String>,
}

impl RelayFilterPipeline {
    pub fn new(
        target_sender: impl Into<String>,
        target_channel: impl Into<String>,
        rate_limit_max: usize,
        rate_limit_window: Duration,
    ) -> Self {
        let target_sender = target_sender.into();
        let target_channel = target_channel.into();
        let tags = topic_tags(&target_channel, &target_sender);
        Self {
            limiter: SlidingWindowLimiter::new(rate_limit_max, rate_limit_window),
            target_sender,
            target_channel,
            tags,
        }
    }

    pub fn from_config(irc: &IrcConfig, filter: &FilterConfig) -> Self {
        Self::new(
            irc.target_sender.clone(),
            irc.channel.clone(),
            filter.rate_limit_max,
            Duration::from_secs(filter.rate_limit_window_secs),
        )
    }

    pub fn evaluate(&mut self, message: &IncomingMessage) -> FilterOutcome {
        if message.sender != self.target_sender {
            return FilterOutcome::rejected(DecisionReason::NotTargetSender);
        }
        if !message.channel.eq_ignore_ascii_case(&self.target_channel) {
            return FilterOutcome::rejected(DecisionReason::NotTargetChannel);
        }
        if !self.limiter.check(&message.sender, message.received_at) {
            debug!(sender = %message.sender, "rate limit reached, dropping message");
            return FilterOutcome::rejected(DecisionReason::RateLimited);
        }

        let content = sanitize(&message.raw_text);
        if content.is_empty() {
            return FilterOutcome::rejected(DecisionReason::EmptyAfterSanitize);
        }

        FilterOutcome {
            decision: RelayDecision::approve(),
            post: Some(OutboundPost {
                content,
                tags: self.tags.clone(),
                created_at: message.received_at,
            }),
        }
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Channel name without its prefix and the sender name, lower-cased.
fn topic_tags(channel: &str, sender: &str) -> BTreeSet<String> {
    let channel = channel.trim_start_matches(['#', '&']).to_lowercase();
    [channel, sender.to_lowercase()]
        .into_iter()
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn pipeline() -> RelayFilterPipeline {
        RelayFilterPipeline::new("BlockBot", "#Bitcoin", 5, Duration::from_secs(60))
    }

    fn msg(sender: &str, channel: &str, text: &str, secs: i64) -> IncomingMessage {
        IncomingMessage::new(sender, channel, text, at(secs))
    }

    #[test]
    fn approves_target_sender_on_target_channel() {
        let outcome = pipeline().evaluate(&msg("BlockBot", "#Bitcoin", " block 840000 ", 0));
        assert!(outcome.decision.approved);
        assert_eq!(outcome.decision.reason, DecisionReason::Approved);

        let post = outcome.post.unwrap();
        assert_eq!(post.content, "block 840000");
        assert_eq!(post.created_at, at(0));
        assert_eq!(post.rendered_content(), "block 840000 #bitcoin #blockbot");
    }

    #[test]
    fn other_sender_is_rejected_first() {
        let outcome = pipeline().evaluate(&msg("OtherBot", "#elsewhere", "", 0));
        assert_eq!(outcome.decision.reason, DecisionReason::NotTargetSender);
        assert!(outcome.post.is_none());
    }

    #[test]
    fn sender_match_is_case_sensitive() {
        let outcome = pipeline().evaluate(&msg("blockbot", "#Bitcoin", "hi", 0));
        assert_eq!(outcome.decision.reason, DecisionReason::NotTargetSender);
    }

    #[test]
    fn channel_match_ignores_ascii_case() {
        let outcome = pipeline().evaluate(&msg("BlockBot", "#BITCOIN", "hi", 0));
        assert!(outcome.decision.approved);
    }

    #[test]
    fn private_message_is_not_target_channel() {
        let outcome = pipeline().evaluate(&msg("BlockBot", "ircnostr", "hi", 0));
        assert_eq!(outcome.decision.reason, DecisionReason::NotTargetChannel);
    }

    #[test]
    fn empty_text_is_rejected_after_sanitize() {
        let outcome = pipeline().evaluate(&msg("BlockBot", "#Bitcoin", "\x0304\x02  ", 0));
        assert_eq!(outcome.decision.reason, DecisionReason::EmptyAfterSanitize);
    }

    #[test]
    fn sixth_message_in_a_minute_is_rate_limited() {
        let mut pipeline = pipeline();
        for i in 0..5 {
            assert!(pipeline.evaluate(&msg("BlockBot", "#Bitcoin", "x", i)).decision.approved);
        }
        let sixth = pipeline.evaluate(&msg("BlockBot", "#Bitcoin", "x", 10));
        assert_eq!(sixth.decision.reason, DecisionReason::RateLimited);
        assert!(pipeline.evaluate(&msg("BlockBot", "#Bitcoin", "x", 61)).decision.approved);
    }

    #[test]
    #[tracing_test::traced_test]
    fn rate_limited_drop_is_logged() {
        let mut pipeline = RelayFilterPipeline::new("BlockBot", "#b", 1, Duration::from_secs(60));
        pipeline.evaluate(&msg("BlockBot", "#b", "x", 0));
        pipeline.evaluate(&msg("BlockBot", "#b", "x", 1));
        assert!(logs_contain("rate limit reached"));
    }

    #[test]
    fn rejected_senders_do_not_consume_rate_limit() {
        let mut pipeline = RelayFilterPipeline::new("BlockBot", "#b", 1, Duration::from_secs(60));
        for i in 0..10 {
            pipeline.evaluate(&msg("OtherBot", "#b", "x", i));
        }
        assert!(pipeline.evaluate(&msg("BlockBot", "#b", "x", 11)).decision.approved);
    }

    #[test]
    fn tags_drop_channel_prefix_and_lowercase() {
        let pipeline = RelayFilterPipeline::new("MempoolBot", "&Ops", 5, Duration::from_secs(60));
        let tags: Vec<_> = pipeline.tags().iter().cloned().collect();
        assert_eq!(tags, vec!["mempoolbot".to_string(), "ops".to_string()]);
    }

    #[test]
    fn built_from_config() {
        let irc = IrcConfig {
            channel: "#blocks".into(),
            target_sender: "BlockBot".into(),
            ..IrcConfig::default()
        };
        let mut pipeline = RelayFilterPipeline::from_config(&irc, &FilterConfig::default());
        assert!(pipeline.evaluate(&msg("BlockBot", "#blocks", "hi", 0)).decision.approved);
    }
}
