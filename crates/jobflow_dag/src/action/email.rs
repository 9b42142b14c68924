//! Email notifications.

use std::sync::Arc;

use serde::Serialize;

use super::{Action, existing_action, remove_first};
use crate::builder::{NodeBuilder, NodeBuilderBase};
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::Node;

/// Sends an email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmailAction {
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: Option<String>,
    body: Option<String>,
    content_type: Option<String>,
    attachment: Option<String>,
}

impl EmailAction {
    /// Returns the recipients.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    /// Returns the carbon-copy recipients.
    #[must_use]
    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    /// Returns the blind carbon-copy recipients.
    #[must_use]
    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    /// Returns the subject line.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the message body.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the MIME content type of the body.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the attachment path.
    #[must_use]
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }
}

impl Action for EmailAction {
    fn kind(&self) -> &'static str {
        "email"
    }
}

/// Builds nodes running an [`EmailAction`].
#[derive(Debug, Clone, Default)]
pub struct EmailActionBuilder {
    base: NodeBuilderBase,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: ModifyOnce<String>,
    body: ModifyOnce<String>,
    content_type: ModifyOnce<String>,
    attachment: ModifyOnce<String>,
}

impl EmailActionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose action fields default to `action`.
    #[must_use]
    pub fn from_action(action: &EmailAction) -> Self {
        Self {
            base: NodeBuilderBase::new(),
            to: action.to.clone(),
            cc: action.cc.clone(),
            bcc: action.bcc.clone(),
            subject: ModifyOnce::from_option(action.subject.clone()),
            body: ModifyOnce::from_option(action.body.clone()),
            content_type: ModifyOnce::from_option(action.content_type.clone()),
            attachment: ModifyOnce::from_option(action.attachment.clone()),
        }
    }

    /// Creates a builder reproducing every field of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::ActionKindMismatch`] if the node is not an email
    /// action.
    pub fn from_existing(node: &Node) -> Result<Self, DagError> {
        let action = existing_action::<EmailAction>(node, "email")?;
        Ok(Self {
            base: NodeBuilderBase::from_node(node),
            ..Self::from_action(action)
        })
    }

    /// Adds a recipient.
    pub fn with_recipient(&mut self, recipient: impl Into<String>) -> &mut Self {
        self.to.push(recipient.into());
        self
    }

    /// Removes the first matching recipient.
    pub fn without_recipient(&mut self, recipient: &str) -> &mut Self {
        remove_first(&mut self.to, &recipient.to_string());
        self
    }

    /// Removes all recipients.
    pub fn clear_recipients(&mut self) -> &mut Self {
        self.to.clear();
        self
    }

    /// Adds a carbon-copy recipient.
    pub fn with_cc(&mut self, recipient: impl Into<String>) -> &mut Self {
        self.cc.push(recipient.into());
        self
    }

    /// Removes the first matching carbon-copy recipient.
    pub fn without_cc(&mut self, recipient: &str) -> &mut Self {
        remove_first(&mut self.cc, &recipient.to_string());
        self
    }

    /// Removes all carbon-copy recipients.
    pub fn clear_cc(&mut self) -> &mut Self {
        self.cc.clear();
        self
    }

    /// Adds a blind carbon-copy recipient.
    pub fn with_bcc(&mut self, recipient: impl Into<String>) -> &mut Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Removes the first matching blind carbon-copy recipient.
    pub fn without_bcc(&mut self, recipient: &str) -> &mut Self {
        remove_first(&mut self.bcc, &recipient.to_string());
        self
    }

    /// Removes all blind carbon-copy recipients.
    pub fn clear_bcc(&mut self) -> &mut Self {
        self.bcc.clear();
        self
    }

    /// Sets the subject line.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the subject was already modified.
    pub fn with_subject(&mut self, subject: impl Into<String>) -> Result<&mut Self, DagError> {
        self.subject.set(subject.into(), "subject")?;
        Ok(self)
    }

    /// Sets the message body.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the body was already modified.
    pub fn with_body(&mut self, body: impl Into<String>) -> Result<&mut Self, DagError> {
        self.body.set(body.into(), "body")?;
        Ok(self)
    }

    /// Sets the MIME content type of the body.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the content type was already
    /// modified.
    pub fn with_content_type(
        &mut self,
        content_type: impl Into<String>,
    ) -> Result<&mut Self, DagError> {
        self.content_type.set(content_type.into(), "content type")?;
        Ok(self)
    }

    /// Sets the attachment path.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the attachment was already
    /// modified.
    pub fn with_attachment(&mut self, attachment: impl Into<String>) -> Result<&mut Self, DagError> {
        self.attachment.set(attachment.into(), "attachment")?;
        Ok(self)
    }

    /// Realizes the action without building a node.
    #[must_use]
    pub fn build_action(&self) -> EmailAction {
        EmailAction {
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject: self.subject.cloned(),
            body: self.body.cloned(),
            content_type: self.content_type.cloned(),
            attachment: self.attachment.cloned(),
        }
    }
}

impl NodeBuilder for EmailActionBuilder {
    fn base(&self) -> &NodeBuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBuilderBase {
        &mut self.base
    }

    fn action(&self) -> Arc<dyn Action> {
        Arc::new(self.build_action())
    }
}
