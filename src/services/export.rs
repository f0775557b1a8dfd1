use chrono::{DateTime, Utc};

use crate::models::{Conversation, Message, MessageType};

pub fn export_to_markdown(conversation: &Conversation, messages: &[Message]) -> String {
    let mut output = format!("# {}\n\n", conversation.name);
    output.push_str(&format!(
        "> Created: {}\n\n",
        format_millis(conversation.created_at)
    ));

    output.push_str("---\n\n");

    for msg in messages {
        let role_label = match msg.kind {
            MessageType::User => "You",
            MessageType::Ai => "Assistant",
        };
        output.push_str(&format!("### {}\n\n{}\n\n", role_label, msg.content));

        if let Some(files) = msg.files.as_ref().filter(|f| !f.is_empty()) {
            output.push_str("Attachments:\n");
            for file in files {
                output.push_str(&format!("- {} ({} bytes)\n", file.name, file.size));
            }
            output.push('\n');
        }

        if let Some(refs) = msg.references.as_ref().filter(|r| !r.is_empty()) {
            output.push_str("Sources:\n");
            for reference in refs {
                output.push_str(&format!("- {} [{}]\n", reference.name, reference.kind));
            }
            output.push('\n');
        }
    }

    output
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileDescriptor, Reference};

    #[test]
    fn test_export_layout() {
        let conversation = Conversation {
            id: "c".into(),
            name: "Lease Review".into(),
            created_at: 0,
            updated_at: 0,
        };
        let messages = vec![
            Message::user(
                "Check this",
                vec![FileDescriptor {
                    name: "lease.pdf".into(),
                    size: "2048".into(),
                    mime_type: "application/pdf".into(),
                }],
            ),
            Message::ai(
                "Looks fine",
                vec![Reference {
                    id: "doc-1".into(),
                    name: "lease.pdf".into(),
                    kind: "pdf".into(),
                }],
                vec!["Thanks".into()],
            ),
        ];

        let md = export_to_markdown(&conversation, &messages);
        assert!(md.starts_with("# Lease Review\n\n> Created: 1970-01-01 00:00\n\n---\n\n"));
        assert!(md.contains("### You\n\nCheck this\n\nAttachments:\n- lease.pdf (2048 bytes)\n"));
        assert!(md.contains("### Assistant\n\nLooks fine\n\nSources:\n- lease.pdf [pdf]\n"));
    }
}
