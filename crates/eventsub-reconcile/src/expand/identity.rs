use eventsub_config::{IdentityBlock, IdentityType};
use eventsub_core::ValidationError;
use eventsub_core::model::ResourceIdentity;

/// Converts an identity block. `field` names the block in errors.
pub fn expand_identity(
    field: &str,
    block: &IdentityBlock,
) -> Result<ResourceIdentity, ValidationError> {
    let user_assigned = block
        .user_assigned_identity
        .as_deref()
        .filter(|id| !id.is_empty());

    match (block.identity_type, user_assigned) {
        (IdentityType::SystemAssigned, None) => Ok(ResourceIdentity::SystemAssigned),
        (IdentityType::SystemAssigned, Some(_)) => Err(ValidationError::new(
            format!("{field}.user_assigned_identity"),
            "must not be set for a SystemAssigned identity",
        )),
        (IdentityType::UserAssigned, Some(id)) => Ok(ResourceIdentity::UserAssigned {
            user_assigned_identity: id.to_string(),
        }),
        (IdentityType::UserAssigned, None) => Err(ValidationError::new(
            format!("{field}.user_assigned_identity"),
            "is required for a UserAssigned identity",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_assigned() {
        let identity = expand_identity("delivery_identity", &IdentityBlock::system_assigned());
        assert_eq!(identity, Ok(ResourceIdentity::SystemAssigned));

        let mut block = IdentityBlock::system_assigned();
        block.user_assigned_identity = Some("/id".into());
        let err = expand_identity("delivery_identity", &block).unwrap_err();
        assert_eq!(err.field, "delivery_identity.user_assigned_identity");
    }

    #[test]
    fn test_user_assigned() {
        let identity = expand_identity("dead_letter_identity", &IdentityBlock::user_assigned("/id"));
        assert_eq!(
            identity,
            Ok(ResourceIdentity::UserAssigned {
                user_assigned_identity: "/id".into()
            })
        );

        let err =
            expand_identity("dead_letter_identity", &IdentityBlock::user_assigned("")).unwrap_err();
        assert_eq!(err.field, "dead_letter_identity.user_assigned_identity");
    }
}
