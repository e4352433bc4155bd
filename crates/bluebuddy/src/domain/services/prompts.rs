//! Prompt Builders
//!
//! Text sent to the language model and spoken to the patient.

use serde_json::json;

use crate::domain::{PatientContext, Transcript};

/// Spoken when the patient asks to end the call
pub const GOODBYE: &str = "Goodbye";

/// Spoken when no reply could be generated
pub const FALLBACK_UTTERANCE: &str = "Sorry, I have experienced a software issue.";

pub const CLASSIFICATION_SCHEMA_NAME: &str = "speech_turn";
pub const SUMMARY_SCHEMA_NAME: &str = "call_summary";

/// Opening line of a call
pub fn greeting(patient: &PatientContext) -> String {
    format!(
        "Hello {}! This is Blue Buddy calling to check in!",
        patient.first_name.trim()
    )
}

/// System turn that opens every transcript
pub fn system_prompt(patient: &PatientContext) -> String {
    let medications = if patient.prescriptions.is_empty() {
        "none on file".to_string()
    } else {
        patient
            .prescriptions
            .iter()
            .map(|(name, status)| format!("{} (last reported: {})", name, status))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut prompt = format!(
        "You are checking in on an elderly patient by phone.\n\
         Their name is {name}. Ask to make sure they are feeling healthy and well, \
         and ask whether they've taken their medications today. Keep your answers reasonably short.\n\
         If at any point it seems like they have a serious concern, remind them they should call \
         their doctor or 9-1-1 for emergencies, but do not call emergency services.\n\
         Ask them one-by-one about their medications after checking in with the patient's personal life, \
         and if they are taking them as prescribed.\n\
         Medications: {medications}\n",
        name = patient.first_name.trim(),
        medications = medications,
    );

    if let Some(bio) = patient.bio.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        prompt.push_str(&format!("\nAbout the patient: {}\n", bio));
    }

    if let Some(topics) = patient.follow_ups() {
        prompt.push_str(&format!(
            "\nHere is a list of follow up topics from the previous phone call. \
             Spend some time discussing these briefly to be more personable at the beginning of the call:\n{}\n",
            topics
        ));
    }

    prompt
}

/// Prompt asking whether to hang up and which medication was discussed
pub fn classification_prompt(transcript: &Transcript) -> String {
    format!(
        "Based on the following conversation, determine the following:\n\
         1) hang_up: whether the patient explicitly requests to end the call and it is appropriate to hang up here.\n\
         2) medication and status: if the patient was asked about a medication they are taking, \
         which one medication they are referring to and its status \
         (taken / not taking / delayed / taking later / need refill). \
         Use an empty string for both when no medication was discussed in the latest reply.\n\n\
         Conversation:\n{}",
        transcript.render()
    )
}

/// Prompt for the end-of-call summary
pub fn summary_prompt(transcript: &Transcript) -> String {
    format!(
        "Please briefly summarize the following conversation between a medical assistant and an elderly patient, \
         and provide a short comma separated list of follow-up keyword topics that the medical assistant \
         should discuss with the patient in their next phone call. If the patient has an emergency concern \
         (extreme pain, suicide, refusal to take medicine, falls, heart attack, etc.), note that as true/false \
         and the primary healthcare provider will be contacted immediately.\n\n\
         Conversation:\n{}",
        transcript.render()
    )
}

pub fn classification_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "hang_up": { "type": "boolean" },
            "medication": { "type": "string" },
            "status": { "type": "string" }
        },
        "required": ["hang_up", "medication", "status"],
        "additionalProperties": false
    })
}

pub fn summary_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "follow_up_topics": { "type": "string" },
            "is_emergency": { "type": "boolean" }
        },
        "required": ["summary", "follow_up_topics", "is_emergency"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> PatientContext {
        PatientContext::new(1, "Jane", "Doe", "+15550100").with_prescription("aspirin", "taken")
    }

    #[test]
    fn test_system_prompt_names_patient_and_medications() {
        let prompt = system_prompt(&jane());
        assert!(prompt.contains("Their name is Jane."));
        assert!(prompt.contains("aspirin (last reported: taken)"));
        assert!(!prompt.contains("follow up topics"));
    }

    #[test]
    fn test_system_prompt_includes_follow_ups() {
        let patient = jane().with_follow_up_topics("piano concert, back pain");
        let prompt = system_prompt(&patient);
        assert!(prompt.contains("follow up topics from the previous phone call"));
        assert!(prompt.contains("piano concert, back pain"));
    }

    #[test]
    fn test_greeting_names_patient() {
        assert_eq!(
            greeting(&jane()),
            "Hello Jane! This is Blue Buddy calling to check in!"
        );
    }
}
