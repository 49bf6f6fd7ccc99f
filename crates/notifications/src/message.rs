//! New-case alert rendering for each outbound channel.

use dentlab_cases::{CaseSource, DentalCase};

/// Rendered alert for one submitted case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Plain text with WhatsApp `*bold*` markup.
    pub text: String,
    pub subject: String,
    pub html: String,
}

impl OutboundMessage {
    pub fn for_new_case(case: &DentalCase) -> Self {
        let units = format!("{} ({})", case.tooth_count(), case.tooth_numbers);
        let delivery = case
            .delivery_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let source = case.source.unwrap_or(CaseSource::Desktop).as_str();

        let text = format!(
            "*New Elegant Smile Case*\n\
             Patient: {}\n\
             Dentist: {}\n\
             Units: {}\n\
             Material: {}\n\
             Prosthesis: {}\n\
             Delivery Date: {}\n\
             Source: {}",
            case.patient_name,
            case.dentist_name,
            units,
            case.material,
            case.prosthesis_type,
            delivery,
            source,
        );

        let rows = [
            ("Patient", case.patient_name.as_str()),
            ("Dentist", case.dentist_name.as_str()),
            ("Units", units.as_str()),
            ("Material", case.material.as_str()),
            ("Prosthesis", case.prosthesis_type.as_str()),
            ("Delivery Date", delivery.as_str()),
            ("Notes", case.notes.as_deref().unwrap_or("None")),
        ];
        let items: String = rows
            .iter()
            .map(|(label, value)| format!("<li><strong>{label}:</strong> {}</li>", escape_html(value)))
            .collect();
        let html = format!(
            "<h1>New Case Added</h1><ul>{items}</ul><p>This is an automated notification.</p>"
        );

        Self {
            text,
            subject: format!("New Elegant Smile Case: {}", case.patient_name),
            html,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
