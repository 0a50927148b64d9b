//! Canned reply selection: one template per settled burst.

use crate::config::ReplyTemplates;

/// Pick the reply text for a settled burst's classification.
pub fn select_template(templates: &ReplyTemplates, has_attachment: bool) -> &str {
    if has_attachment {
        &templates.attachment_ack
    } else {
        &templates.solicitation
    }
}
