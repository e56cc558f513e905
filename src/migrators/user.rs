use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::context::{AppLegacy, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::legacy::LegacyUser;
use crate::media::MediaPipeline;
use crate::migrators::past::{check_past, clear_stale, fetch_record, Discard};
use crate::migrators::tables::{fix_extension, MailDomain};
use crate::migrators::{CleanReport, EntityMigrator, MigrationReport, MigrationStage};
use crate::models::{generate_id, Document, EntityKind, MediaRole, StoreSlot, User, UserProfile};
use crate::repositories::{DocumentRepository, IdMapper};

/// Profile pictures live in the active store.
const PICTURE_SLOT: StoreSlot = StoreSlot::Active;

#[derive(FromContext, Clone)]
pub struct UserMigrator {
    legacy: AppLegacy,
    mapper: IdMapper,
    documents: DocumentRepository,
    media: MediaPipeline,
    config: Arc<Config>,
}

/// Builds the target user without its picture.
pub fn user_document(
    id: String,
    legacy: &LegacyUser,
    primary: &MailDomain,
    institute: &MailDomain,
) -> User {
    let candidates = [legacy.email.as_str(), legacy.login.as_str()];
    User {
        id,
        full_name: legacy.display_name.trim().to_string(),
        email: primary.normalize(&candidates, &legacy.login),
        institute_mail: institute.normalize(&candidates, &legacy.login),
        account_type: 2,
        picture: None,
        old_user_id: legacy.user_id,
        old_user_name: legacy.login.clone(),
        is_newsletter_subscribed: true,
        profile: UserProfile {
            bio: legacy.bio.clone(),
            facebook: legacy.facebook.clone(),
            twitter: legacy.twitter.clone(),
            website: legacy.website.clone(),
        },
        contributions: vec![],
    }
}

impl UserMigrator {
    fn picture_url(&self, file: &str) -> String {
        format!(
            "{}/user/{}?tr=n-square",
            self.config.media.active_source.trim_end_matches('/'),
            fix_extension(file)
        )
    }

    fn discard(&self) -> Discard<'_> {
        Discard {
            mapper: &self.mapper,
            documents: &self.documents,
            media: &self.media,
            kind: EntityKind::User,
            slot: PICTURE_SLOT,
        }
    }

    /// Removes the user unless another legacy login was merged into it, in
    /// which case only this record's mapping is dropped.
    async fn clean_target(&self, legacy_id: i64, user_id: &str) -> Result<(), AppError> {
        MigrationStage::CleanPast.enter();
        let sharers = self.mapper.legacy_ids_for(EntityKind::User, user_id).await?;
        if sharers.iter().any(|id| *id != legacy_id) {
            tracing::info!(user = %user_id, sharers = ?sharers, "Keeping user shared by merged logins");
        } else {
            self.media.delete_for_owner(user_id, PICTURE_SLOT).await;
            self.documents.delete_in(User::COLLECTION, user_id).await?;
        }
        self.mapper.clear(EntityKind::User, legacy_id).await
    }

    /// Creates the user, or merges into an existing user with the same email.
    ///
    /// The flag is true when a new document was created.
    async fn create_or_merge(&self, mut user: User) -> Result<(User, bool), AppError> {
        let existing = self
            .documents
            .find_by_field::<User>("email", &user.email)
            .await?;

        match existing.into_iter().next() {
            Some(clash) => {
                tracing::warn!(email = %user.email, user = %clash.id, "Email already migrated, merging");
                user.id = clash.id;
                self.documents.replace(&user).await?;
                Ok((user, false))
            }
            None => {
                self.documents.create(&user).await?;
                Ok((user, true))
            }
        }
    }

    /// Picture and REMAP. Returns the produced media IDs.
    async fn attach_and_remap(
        &self,
        legacy_id: i64,
        user: &User,
        legacy: &LegacyUser,
    ) -> Result<Vec<String>, AppError> {
        let mut media_ids = vec![];
        if let Some(file) = &legacy.display_picture {
            let url = self.picture_url(file);
            match self
                .media
                .migrate(&url, EntityKind::User, &user.id, MediaRole::Profile, PICTURE_SLOT)
                .await
            {
                Ok(asset) => {
                    self.documents
                        .update::<User>(&user.id, json!({ "picture": asset.image_ref() }))
                        .await?;
                    media_ids.push(asset.id);
                }
                Err(e) => {
                    tracing::warn!(url = %url, code = e.code(), error = %e, "Skipping profile picture")
                }
            }
        }

        MigrationStage::Remap.enter();
        self.mapper.set(EntityKind::User, legacy_id, &user.id).await?;
        Ok(media_ids)
    }
}

#[async_trait]
impl EntityMigrator for UserMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError> {
        let row = fetch_record(self.legacy.as_ref(), EntityKind::User, legacy_id).await?;
        let legacy = LegacyUser::from_row(&row)?;

        let replaced = check_past(&self.mapper, &self.documents, EntityKind::User, legacy_id).await?;
        if let Some(old) = &replaced {
            self.clean_target(legacy_id, old).await?;
        }

        MigrationStage::Transduce.enter();
        let primary = MailDomain::new(&self.config.users.primary_domain)?;
        let institute = MailDomain::new(&self.config.users.institute_domain)?;
        let user = user_document(generate_id(), &legacy, &primary, &institute);

        MigrationStage::Persist.enter();
        let (user, created) = self.create_or_merge(user).await?;
        let media_ids = match self.attach_and_remap(legacy_id, &user, &legacy).await {
            Ok(media_ids) => media_ids,
            Err(err) => {
                // A merged document still belongs to the login it was merged into.
                if created {
                    self.discard().run(legacy_id, &user.id, &err).await;
                }
                return Err(err);
            }
        };

        Ok(MigrationReport {
            kind: EntityKind::User,
            legacy_id,
            new_id: user.id,
            replaced,
            media_ids,
        })
    }

    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        match check_past(&self.mapper, &self.documents, EntityKind::User, legacy_id).await? {
            Some(user_id) => {
                self.clean_target(legacy_id, &user_id).await?;
                Ok(Some(user_id))
            }
            None => {
                clear_stale(&self.mapper, EntityKind::User, legacy_id).await?;
                Ok(None)
            }
        }
    }

    async fn clean_all(&self) -> Result<CleanReport, AppError> {
        let media = self
            .media
            .delete_by_owner_kind(EntityKind::User, PICTURE_SLOT)
            .await;
        let ids = self.documents.list_ids(User::COLLECTION).await?;
        let documents = self.documents.delete_many::<User>(&ids).await?;
        let mappings = self.mapper.clear_all(EntityKind::User).await?;

        Ok(CleanReport {
            kind: EntityKind::User,
            documents,
            mappings,
            media,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_user() -> LegacyUser {
        LegacyUser {
            user_id: 12,
            login: "jane doe".to_string(),
            email: "jane@yahoo.com".to_string(),
            display_name: " Jane Doe ".to_string(),
            bio: Some("Writer".to_string()),
            facebook: None,
            twitter: None,
            website: None,
            display_picture: Some("Jane.PNG".to_string()),
            mapped_id: String::new(),
        }
    }

    #[test]
    fn test_user_document_fields() {
        let primary = MailDomain::new("gmail.com").unwrap();
        let institute = MailDomain::new("example.edu").unwrap();
        let user = user_document("u1".to_string(), &legacy_user(), &primary, &institute);

        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.email, "transfer-janedoe@gmail.com");
        assert_eq!(user.institute_mail, "transfer-janedoe@example.edu");
        assert_eq!(user.account_type, 2);
        assert!(user.is_newsletter_subscribed);
        assert_eq!(user.old_user_name, "jane doe");

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["profile"], json!({ "bio": "Writer" }));
        assert!(value.get("picture").is_none());
        assert!(value.get("contributions").is_none());
    }
}
