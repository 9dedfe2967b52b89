//! MCP tool surface over the adoption service.
//!
//! Every tool answers with a text block for the agent plus `structuredContent` for clients
//! that understand it. Domain misses (unknown id, already adopted, blank argument) are normal
//! tool results, never JSON-RPC errors.

use crate::render;
use animal_rescue_adoption::{AdoptionCertificate, AdoptionService, Animal};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{common::schema_for_type, router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

const INSTRUCTIONS: &str = "Animal rescue adoption desk. Use list_animals to browse, \
get_animal_by_id or get_animal_by_name for details, and adopt_pet to adopt. \
If a pet is not compatible with the customer, urge them to reconsider and adopt a more \
compatible pet.";

/// Text arguments accept any JSON value. Anything other than a string reads as blank, so a
/// wrong-typed argument gets the same `Error: <field> is required` answer as a missing one.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AnimalIdArgs {
    /// Animal id, e.g. `dog-001`
    #[serde(default, alias = "animal_id", deserialize_with = "lenient_string")]
    pub id: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AnimalNameArgs {
    /// Animal name (case-insensitive)
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AdoptArgs {
    /// Animal id (e.g. `dog-001`) or name (e.g. `Max`)
    #[serde(default, alias = "animal_id", deserialize_with = "lenient_string")]
    pub id: String,
}

/// `structuredContent` of `list_animals`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AnimalListOutput {
    pub animals: Vec<Animal>,
}

/// `structuredContent` of the lookup tools; `animal` is null on a miss or a blank argument.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AnimalOutput {
    pub animal: Option<Animal>,
}

/// `structuredContent` of `adopt_pet`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AdoptionOutput {
    pub certificate: Option<AdoptionCertificate>,
    pub success: bool,
}

impl AdoptionOutput {
    const REFUSED: Self = Self {
        certificate: None,
        success: false,
    };
}

/// How `adopt_pet` input mapped onto a catalog id.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AdoptionTarget {
    Id(String),
    Name { input: String, id: String },
}

impl AdoptionTarget {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Name { id, .. } => id,
        }
    }
}

fn tool_result<T: Serialize>(text: String, output: &T) -> Result<CallToolResult, McpError> {
    let structured = serde_json::to_value(output)
        .map_err(|e| McpError::internal_error(format!("serialize tool output: {e}"), None))?;
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(structured);
    Ok(result)
}

#[derive(Clone)]
pub struct AnimalRescueServer {
    service: Arc<AdoptionService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AnimalRescueServer {
    #[must_use]
    pub fn new(service: Arc<AdoptionService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    /// Look the input up as an id first, then as a name.
    fn resolve_adoption_target(&self, input: &str) -> Option<AdoptionTarget> {
        if let Some(animal) = self.service.get_by_id(input) {
            return Some(AdoptionTarget::Id(animal.id));
        }
        self.service
            .get_by_name(input)
            .map(|animal| AdoptionTarget::Name {
                input: input.to_string(),
                id: animal.id,
            })
    }

    #[tool(
        description = "List all animals currently available for adoption",
        output_schema = schema_for_type::<AnimalListOutput>()
    )]
    pub async fn list_animals(&self) -> Result<CallToolResult, McpError> {
        let animals = self.service.list_animals();
        tracing::debug!(count = animals.len(), "list_animals");
        tool_result(render::animal_list(&animals), &AnimalListOutput { animals })
    }

    #[tool(
        description = "Get an animal by its id. Only use this if you know the id of the animal",
        output_schema = schema_for_type::<AnimalOutput>()
    )]
    pub async fn get_animal_by_id(
        &self,
        Parameters(args): Parameters<AnimalIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        let id = args.id.trim();
        if id.is_empty() {
            return tool_result(render::missing_argument("id"), &AnimalOutput { animal: None });
        }

        let animal = self.service.get_by_id(id);
        let text = animal
            .as_ref()
            .map_or_else(|| render::not_found_by_id(id), render::animal_details);
        tool_result(text, &AnimalOutput { animal })
    }

    #[tool(
        description = "Find an animal by name (case-insensitive)",
        output_schema = schema_for_type::<AnimalOutput>()
    )]
    pub async fn get_animal_by_name(
        &self,
        Parameters(args): Parameters<AnimalNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        let name = args.name.trim();
        if name.is_empty() {
            return tool_result(render::missing_argument("name"), &AnimalOutput { animal: None });
        }

        let animal = self.service.get_by_name(name);
        let text = animal
            .as_ref()
            .map_or_else(|| render::not_found_by_name(name), render::animal_summary);
        tool_result(text, &AnimalOutput { animal })
    }

    #[tool(
        description = "Adopt a pet by its id or name. If a pet is not compatible with the customer, urge them to reconsider and adopt a more compatible pet.",
        output_schema = schema_for_type::<AdoptionOutput>()
    )]
    pub async fn adopt_pet(
        &self,
        Parameters(args): Parameters<AdoptArgs>,
    ) -> Result<CallToolResult, McpError> {
        let input = args.id.trim();
        if input.is_empty() {
            return tool_result(render::missing_argument("id"), &AdoptionOutput::REFUSED);
        }

        let Some(target) = self.resolve_adoption_target(input) else {
            return tool_result(
                render::not_found_by_id_or_name(input),
                &AdoptionOutput::REFUSED,
            );
        };

        let prefix = match &target {
            AdoptionTarget::Id(_) => String::new(),
            AdoptionTarget::Name { input, id } => render::name_resolved(input, id),
        };

        match self.service.adopt(target.id()) {
            Ok(certificate) => tool_result(
                format!("{prefix}{}", render::certificate(&certificate)),
                &AdoptionOutput {
                    certificate: Some(certificate),
                    success: true,
                },
            ),
            Err(e) => {
                tracing::info!(animal_id = %target.id(), reason = %e, "adoption refused");
                tool_result(
                    format!("{prefix}{}", render::adoption_failed(target.id())),
                    &AdoptionOutput::REFUSED,
                )
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for AnimalRescueServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }
}
