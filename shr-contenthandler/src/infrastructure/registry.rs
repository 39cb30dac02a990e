use std::collections::HashMap;
use std::sync::RwLock;

use crate::application_service::content_handler::{
    ContentHandler, Discriminator, HandlerContext, UnstructuredDataHandler,
};
use crate::domain::{CodedValue, Content};

type CodePair = (CodedValue, CodedValue);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a handler is already registered for {0}")]
    AlreadyRegistered(Discriminator),
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Routes content to the handler registered for its content type or its
/// type/format codes.
///
/// Lookups always return a fresh [`ContentHandler::clone_handler`] copy. When
/// nothing is registered for a key, an [`UnstructuredDataHandler`] for that
/// key is returned instead.
#[derive(Debug)]
pub struct ContentHandlerRegistry {
    by_content_type: RwLock<HashMap<String, Box<dyn ContentHandler>>>,
    by_codes: RwLock<HashMap<CodePair, Box<dyn ContentHandler>>>,
    context: HandlerContext,
}

impl ContentHandlerRegistry {
    /// `context` backs the default handlers created for unregistered keys.
    pub fn new(context: HandlerContext) -> Self {
        Self {
            by_content_type: RwLock::new(HashMap::new()),
            by_codes: RwLock::new(HashMap::new()),
            context,
        }
    }

    pub fn register_by_content_type(
        &self,
        content_type: impl Into<String>,
        handler: impl ContentHandler + 'static,
    ) -> Result<(), RegistryError> {
        let content_type = content_type.into();
        let mut handlers = self
            .by_content_type
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;

        if handlers.contains_key(&content_type) {
            return Err(RegistryError::AlreadyRegistered(
                Discriminator::ContentType(content_type),
            ));
        }
        tracing::debug!(content_type = %content_type, "registered content handler");
        handlers.insert(content_type, Box::new(handler));
        Ok(())
    }

    pub fn register_by_codes(
        &self,
        type_code: CodedValue,
        format_code: CodedValue,
        handler: impl ContentHandler + 'static,
    ) -> Result<(), RegistryError> {
        let mut handlers = self
            .by_codes
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;

        let key = (type_code, format_code);
        if handlers.contains_key(&key) {
            let (type_code, format_code) = key;
            return Err(RegistryError::AlreadyRegistered(Discriminator::Codes {
                type_code,
                format_code,
            }));
        }
        tracing::debug!(type_code = %key.0, format_code = %key.1, "registered content handler");
        handlers.insert(key, Box::new(handler));
        Ok(())
    }

    pub fn deregister_by_content_type(&self, content_type: &str) -> Result<(), RegistryError> {
        self.by_content_type
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?
            .remove(content_type);
        Ok(())
    }

    pub fn deregister_by_codes(
        &self,
        type_code: &CodedValue,
        format_code: &CodedValue,
    ) -> Result<(), RegistryError> {
        self.by_codes
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?
            .remove(&(type_code.clone(), format_code.clone()));
        Ok(())
    }

    pub fn is_registered_content_type(&self, content_type: &str) -> Result<bool, RegistryError> {
        Ok(self
            .by_content_type
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?
            .contains_key(content_type))
    }

    pub fn is_registered_codes(
        &self,
        type_code: &CodedValue,
        format_code: &CodedValue,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .by_codes
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?
            .contains_key(&(type_code.clone(), format_code.clone())))
    }

    pub fn handler_for_content_type(
        &self,
        content_type: &str,
    ) -> Result<Box<dyn ContentHandler>, RegistryError> {
        let handlers = self
            .by_content_type
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;

        Ok(match handlers.get(content_type) {
            Some(handler) => handler.clone_handler(),
            None => Box::new(UnstructuredDataHandler::for_content_type(
                content_type,
                self.context.clone(),
            )),
        })
    }

    pub fn handler_for_codes(
        &self,
        type_code: &CodedValue,
        format_code: &CodedValue,
    ) -> Result<Box<dyn ContentHandler>, RegistryError> {
        let handlers = self
            .by_codes
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;

        Ok(match handlers.get(&(type_code.clone(), format_code.clone())) {
            Some(handler) => handler.clone_handler(),
            None => Box::new(UnstructuredDataHandler::for_codes(
                type_code.clone(),
                format_code.clone(),
                self.context.clone(),
            )),
        })
    }

    /// Picks the handler for `content`: a registration by codes wins over one
    /// by content type. Without either, the default handler is keyed by codes
    /// when the content has them. `None` when the content has neither codes
    /// nor a content type.
    pub fn handler_for_content(
        &self,
        content: &Content,
    ) -> Result<Option<Box<dyn ContentHandler>>, RegistryError> {
        let codes = content.type_code().zip(content.format_code());

        if let Some((type_code, format_code)) = codes {
            if self.is_registered_codes(type_code, format_code)? {
                return self.handler_for_codes(type_code, format_code).map(Some);
            }
        }
        if let Some(content_type) = content.content_type() {
            if self.is_registered_content_type(content_type)? {
                return self.handler_for_content_type(content_type).map(Some);
            }
        }

        let discriminator = match (codes, content.content_type()) {
            (Some((type_code, format_code)), _) => Discriminator::Codes {
                type_code: type_code.clone(),
                format_code: format_code.clone(),
            },
            (None, Some(content_type)) => Discriminator::ContentType(content_type.to_string()),
            (None, None) => return Ok(None),
        };
        Ok(Some(Box::new(UnstructuredDataHandler::with_discriminator(
            discriminator,
            self.context.clone(),
        ))))
    }
}
