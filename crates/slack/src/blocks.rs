//! Block Kit message templates for the approvals channel.
//!
//! Rendering is pure: request in, serializable block tree out. The gateway
//! decides where the JSON goes.

use serde::Serialize;

use banquet_core::domain::request::{CateringRequest, DecisionKind, DecisionRecord};
use banquet_core::format;

/// Button action ids, matched against inbound `block_actions` payloads.
pub const APPROVE_ALL_ACTION: &str = "approve_all";
pub const PARTIAL_ACTION: &str = "partial_approval";
pub const DENY_ACTION: &str = "deny_request";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    #[serde(rename = "type")]
    kind: &'static str,
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: "button",
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        block_id: String,
        text: TextObject,
    },
    Section {
        block_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Actions {
        block_id: String,
        elements: Vec<ButtonElement>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
    Divider {
        block_id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks
            .push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, fields) = builder.build();
        self.blocks.push(Block::Section { block_id: block_id.into(), text, fields });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    fields: Vec<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn field(&mut self, text: impl Into<String>) -> &mut Self {
        self.fields.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> (Option<TextObject>, Vec<TextObject>) {
        (self.text, self.fields)
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// The approval message posted when a new request arrives, with the three
/// decision buttons. Every button carries the request id as its value.
pub fn new_request_message(request: &CateringRequest) -> MessageTemplate {
    let request_id = request.id.to_string();

    MessageBuilder::new(format!("New catering request: {}", request.event_name))
        .header("catering.header.v1", "🍽️ New Catering Request")
        .section("catering.facts.v1", |section| {
            section
                .field(format!("*Event:*\n{}", request.event_name))
                .field(format!("*Client:*\n{}", request.client_name))
                .field(format!("*Date:*\n{}", format::long_event_date(&request.event_date)))
                .field(format!("*Expected guests:*\n{}", request.guest_count));
        })
        .section("catering.rooms.v1", |section| {
            section.mrkdwn(format!("*Rooms requested:*\n{}", request.rooms.join(", ")));
        })
        .section("catering.timeline.v1", |section| {
            section.mrkdwn(format!(
                "*Timeline:*\nSetup: {} {}\nEvent: {} - {}\nTeardown: {} {}",
                format::long_event_date(&request.timeline.setup.date),
                format::clock_time_12h(&request.timeline.setup.time),
                format::clock_time_12h(&request.timeline.event_start.time),
                format::clock_time_12h(&request.timeline.event_end.time),
                format::long_event_date(&request.timeline.teardown.date),
                format::clock_time_12h(&request.timeline.teardown.time),
            ));
        })
        .section("catering.extras.v1", |section| {
            section.mrkdwn(render_extras(request));
        })
        .context("catering.planner.v1", |context| {
            context.mrkdwn(format!(
                "Planner: {} · {} · {}",
                request.planner.name, request.planner.email, request.planner.phone
            ));
        })
        .divider("catering.divider.v1")
        .actions("catering.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new(APPROVE_ALL_ACTION, "Approve All")
                        .style(ButtonStyle::Primary)
                        .value(request_id.clone()),
                )
                .button(ButtonElement::new(PARTIAL_ACTION, "Partial Approval").value(request_id.clone()))
                .button(
                    ButtonElement::new(DENY_ACTION, "Deny")
                        .style(ButtonStyle::Danger)
                        .value(request_id),
                );
        })
        .build()
}

fn render_extras(request: &CateringRequest) -> String {
    let mut lines = Vec::new();
    if let Some(officiant) = &request.officiant {
        lines.push(format!("Officiant: {officiant}"));
    }
    lines.push(format!("Parking: {}", yes_no(request.parking_needed)));
    lines.push(format!("Music: {}", yes_no(request.music_requested)));
    if let Some(notes) = &request.notes {
        lines.push(format!("Notes: {notes}"));
    }
    lines.join("\n")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// The in-place replacement for the approval message after a decision lands:
/// same facts, action buttons gone, status section appended.
pub fn decided_message(request: &CateringRequest, decision: &DecisionRecord) -> MessageTemplate {
    let mut template = new_request_message(request);
    template.blocks.retain(|block| !matches!(block, Block::Actions { .. }));
    template.fallback_text = format!(
        "Catering request {}: {}",
        format::status_label(&decision.kind).to_lowercase(),
        request.event_name
    );

    let mut status = format!(
        "*Status:* {}\n*By:* <@{}> on {}",
        format::status_label(&decision.kind),
        decision.actor_user_id,
        format::decision_stamp(decision.decided_at)
    );
    match &decision.kind {
        DecisionKind::Approved => {}
        DecisionKind::Partial { approved_rooms, declined_rooms, note } => {
            status.push_str(&format!("\n*Approved rooms:* {}", approved_rooms.join(", ")));
            status.push_str(&format!("\n*Declined rooms:* {}", declined_rooms.join(", ")));
            if let Some(note) = note {
                status.push_str(&format!("\n*Note:* {note}"));
            }
        }
        DecisionKind::Denied { reason } => {
            status.push_str(&format!("\n*Reason:* {reason}"));
        }
    }

    template.blocks.push(Block::Section {
        block_id: "catering.status.v1".to_string(),
        text: Some(TextObject::mrkdwn(status)),
        fields: Vec::new(),
    });
    template
}

/// Short confirmation posted in the message thread after the decision email
/// goes out.
pub fn decision_thread_reply(request: &CateringRequest, decision: &DecisionRecord) -> String {
    format!(
        "Decision recorded: *{}* by <@{}>. The caterer has been notified by email.\nRequest `{}`.",
        format::status_label(&decision.kind),
        decision.actor_user_id,
        request.id
    )
}
