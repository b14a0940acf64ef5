//! Goal actions as pipeline configurations
//!
//! Each builder picks the contract, function, payload and argument order for
//! one user action. File payloads are size-checked here, before anything is
//! uploaded.

use pledge_ipfs::{validate_file_size, StoreError};
use pledge_types::{ArgValue, CallTarget, ChainContext, Payload, SubmissionRequest};
use serde_json::json;

/// Public profile document stored on IPFS and pointed to by the profile contract
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

fn goal_call(context: &ChainContext, function: &str) -> SubmissionRequest {
    SubmissionRequest::new(
        CallTarget::new(context.contracts.goal.clone(), function),
        context.chain.clone(),
    )
}

/// Create a goal: the description goes to IPFS, the stake is sent with the call
pub fn create_goal(context: &ChainContext, description: &str, deadline: u64, stake: u128) -> SubmissionRequest {
    goal_call(context, "set")
        .with_payload(Payload::Json(json!({ "description": description })))
        .arg(ArgValue::ContentSlot)
        .arg(ArgValue::Uint(deadline as u128))
        .arg(ArgValue::Uint(stake))
        .with_success_message("Goal created")
}

pub fn post_message(context: &ChainContext, goal_id: u64, message: &str) -> SubmissionRequest {
    goal_call(context, "postMessage")
        .with_payload(Payload::Json(json!({ "message": message })))
        .arg(ArgValue::Uint(goal_id as u128))
        .arg(ArgValue::ContentSlot)
        .with_success_message("Message posted")
}

pub fn accept_motivator(context: &ChainContext, goal_id: u64, motivator: &str) -> SubmissionRequest {
    goal_call(context, "acceptMotivator")
        .arg(ArgValue::Uint(goal_id as u128))
        .arg(ArgValue::Address(motivator.to_string()))
        .with_success_message("Motivator accepted")
}

pub fn watch_goal(context: &ChainContext, goal_id: u64) -> SubmissionRequest {
    goal_call(context, "watch")
        .arg(ArgValue::Uint(goal_id as u128))
        .with_success_message("You are now watching this goal")
}

/// Attach a proof file. Files of 2 MiB or more are rejected.
pub fn add_proof(
    context: &ChainContext,
    goal_id: u64,
    file_name: Option<String>,
    bytes: Vec<u8>,
) -> Result<SubmissionRequest, StoreError> {
    validate_file_size(bytes.len())?;

    Ok(goal_call(context, "addProof")
        .with_payload(Payload::File { name: file_name, bytes })
        .arg(ArgValue::Uint(goal_id as u128))
        .arg(ArgValue::ContentSlot)
        .with_success_message("Proof added"))
}

pub fn close_as_achieved(context: &ChainContext, goal_id: u64) -> SubmissionRequest {
    goal_call(context, "closeAsAchieved")
        .arg(ArgValue::Uint(goal_id as u128))
        .with_success_message("Goal closed as achieved")
}

pub fn close_as_failed(context: &ChainContext, goal_id: u64) -> SubmissionRequest {
    goal_call(context, "closeAsFailed")
        .arg(ArgValue::Uint(goal_id as u128))
        .with_success_message("Goal closed as failed")
}

pub fn edit_profile(context: &ChainContext, profile: &ProfileDocument) -> SubmissionRequest {
    let mut document = json!({ "name": profile.name });
    for (key, value) in [
        ("about", &profile.about),
        ("image", &profile.image),
        ("twitter", &profile.twitter),
    ] {
        if let Some(value) = value {
            document[key] = json!(value);
        }
    }

    SubmissionRequest::new(
        CallTarget::new(context.contracts.profile.clone(), "setURI"),
        context.chain.clone(),
    )
    .with_payload(Payload::Json(document))
    .arg(ArgValue::ContentSlot)
    .with_success_message("Profile updated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledge_ipfs::MAX_FILE_BYTES;
    use pledge_types::{ChainId, ContractBook, PayloadKind};

    fn context() -> ChainContext {
        ChainContext::new(
            ChainId::eip155(84532),
            ContractBook {
                goal: "0xgoal".to_string(),
                profile: "0xprofile".to_string(),
                treasury: "0xtreasury".to_string(),
            },
        )
    }

    #[test]
    fn test_post_message_shape() {
        let request = post_message(&context(), 4, "gm");
        assert_eq!(request.target.contract, "0xgoal");
        assert_eq!(request.target.function, "postMessage");
        assert_eq!(request.payload, Payload::Json(json!({ "message": "gm" })));
        assert_eq!(request.args, vec![ArgValue::Uint(4), ArgValue::ContentSlot]);
        assert_eq!(request.success_message, "Message posted");
    }

    #[test]
    fn test_actions_without_payload() {
        for request in [
            accept_motivator(&context(), 1, "0xfriend"),
            watch_goal(&context(), 1),
            close_as_achieved(&context(), 1),
            close_as_failed(&context(), 1),
        ] {
            assert_eq!(request.payload.kind(), PayloadKind::None);
            assert!(!request.has_content_slot());
        }
    }

    #[test]
    fn test_create_goal_args() {
        let request = create_goal(&context(), "run a marathon", 1_900_000_000, 10_000_000_000_000_000);
        assert_eq!(request.target.function, "set");
        assert_eq!(
            request.args,
            vec![
                ArgValue::ContentSlot,
                ArgValue::Uint(1_900_000_000),
                ArgValue::Uint(10_000_000_000_000_000)
            ]
        );
    }

    #[test]
    fn test_add_proof_size_limit() {
        assert!(add_proof(&context(), 2, Some("a.png".to_string()), vec![0; 1024]).is_ok());

        let err = add_proof(&context(), 2, None, vec![0; MAX_FILE_BYTES]).unwrap_err();
        assert!(matches!(err, StoreError::TooLarge { .. }));
    }

    #[test]
    fn test_edit_profile_targets_profile_contract() {
        let profile = ProfileDocument {
            name: "alice".to_string(),
            about: Some("runner".to_string()),
            ..Default::default()
        };
        let request = edit_profile(&context(), &profile);
        assert_eq!(request.target.contract, "0xprofile");
        assert_eq!(request.payload, Payload::Json(json!({ "name": "alice", "about": "runner" })));
    }

    #[test]
    fn test_edit_profile_keeps_every_field() {
        let profile = ProfileDocument {
            name: "alice".to_string(),
            about: Some("runner".to_string()),
            image: Some("ipfs://bafyavatar".to_string()),
            twitter: Some("@alice".to_string()),
        };
        let Payload::Json(document) = edit_profile(&context(), &profile).payload else {
            panic!("profile payload must be JSON");
        };

        let decoded: ProfileDocument = serde_json::from_value(document).unwrap();
        assert_eq!(decoded, profile);
    }
}
