//! Central registry for all user-facing message templates.
//!
//! Naming: `{workflow}_{stage}` for workflow acknowledgements, `error_*` for
//! failures. Templates use `{variable}` placeholders filled by
//! [`crate::MessageBuilder`].

pub struct Messages {
    // Create
    pub create_in_progress: &'static str,
    pub create_success: &'static str,
    pub create_partial: &'static str,

    // Archive
    pub archive_in_progress: &'static str,
    pub archive_success: &'static str,

    // Unarchive
    pub unarchive_in_progress: &'static str,
    pub unarchive_success: &'static str,

    // Delete
    pub delete_in_progress: &'static str,
    pub delete_success: &'static str,

    // Failures
    pub error_generic: &'static str,
    pub error_config: &'static str,
    pub step_failed_header: &'static str,
    pub step_failed: &'static str,
}

pub const MESSAGES: Messages = Messages {
    create_in_progress: "Création de {name}…",
    create_success: "✅ {name} créé (rôle {group_id}).",
    create_partial: "⚠️ {failed} ressource(s) sur {total} n'ont pas pu être créées.",

    archive_in_progress: "Archivage de {name}…",
    archive_success: "🗃️ {name} archivé ({moved} salons, {voice_deleted} vocaux supprimés).",

    unarchive_in_progress: "Désarchivage de {name}…",
    unarchive_success: "📂 {name} désarchivé ({moved} salons, rôle {group_id}).",

    delete_in_progress: "Suppression de {name}…",
    delete_success: "🗑️ {name} supprimé ({text_deleted} salons, {voice_deleted} vocaux).",

    error_generic: "❌ Erreur : {error}",
    error_config: "❌ Configuration invalide : {error}",
    step_failed_header: "⚠️ {count} étape(s) en échec :",
    step_failed: "  • {action} {target} : {error}",
};
