use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{OpenApiError, ToolError};
use crate::mcp::catalog::ToolDef;
use crate::openapi::document::OpenApiDocument;
use crate::openapi::routes::{is_excluded, ExcludedRoute};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::transport::{ApiRequest, HttpTransport};
use crate::utils::args::{path_segment, scalar_as_string};

const METHODS: &[&str] = &["get", "put", "post", "delete", "patch", "head", "options"];

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    None,
    /// Declared top-level properties of an object body.
    Object(Vec<String>),
    /// Any other body shape, taken whole from the `body` argument.
    Whole,
}

/// One API operation as seen by its generated tool.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub method: Method,
    pub path_template: String,
    pub path_params: Vec<String>,
    pub query_params: Vec<(String, bool)>,
    pub body: RequestBody,
}

impl Operation {
    fn render_path(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let mut path = self.path_template.clone();
        for name in &self.path_params {
            let raw = args
                .get(name)
                .and_then(scalar_as_string)
                .ok_or_else(|| ToolError::invalid_params(format!("{} is required", name)))?;
            let segment = path_segment(name, raw.trim())?;
            path = path.replace(&format!("{{{}}}", name), &segment);
        }
        Ok(path)
    }

    fn render_query(&self, args: &Map<String, Value>) -> Result<Vec<(String, String)>, ToolError> {
        let mut query = Vec::new();
        for (name, required) in &self.query_params {
            match args.get(name) {
                None | Some(Value::Null) => {
                    if *required {
                        return Err(ToolError::invalid_params(format!("{} is required", name)));
                    }
                }
                Some(Value::Array(items)) => {
                    for item in items.iter().filter(|item| !item.is_null()) {
                        query.push((name.clone(), query_value(item)));
                    }
                }
                Some(value) => query.push((name.clone(), query_value(value))),
            }
        }
        Ok(query)
    }

    fn render_body(&self, args: &Map<String, Value>) -> Option<Value> {
        match &self.body {
            RequestBody::None => None,
            RequestBody::Object(properties) => Some(Value::Object(
                properties
                    .iter()
                    .filter_map(|name| args.get(name).map(|v| (name.clone(), v.clone())))
                    .collect(),
            )),
            RequestBody::Whole => args.get("body").cloned(),
        }
    }

    pub fn build_request(&self, args: &Map<String, Value>) -> Result<ApiRequest, ToolError> {
        let mut request = ApiRequest::new(self.method.clone(), self.render_path(args)?)
            .with_query(self.render_query(args)?);
        request.body = self.render_body(args);
        Ok(request)
    }
}

fn query_value(value: &Value) -> String {
    scalar_as_string(value).unwrap_or_else(|| value.to_string())
}

/// Generated handler: renders the declared arguments into a request and
/// returns the upstream body.
pub struct OpenApiTool {
    operation: Operation,
    transport: Arc<dyn HttpTransport>,
}

impl OpenApiTool {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

#[async_trait]
impl ToolHandler for OpenApiTool {
    async fn handle(&self, args: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let request = self.operation.build_request(&args)?;
        let response = self.transport.send(request).await?;
        let success = response.is_success();
        let payload = response.into_payload();
        Ok(if success {
            ToolOutput::ok(payload)
        } else {
            ToolOutput::error(payload)
        })
    }
}

struct ParamDecl {
    name: String,
    location: String,
    required: bool,
    schema: Value,
}

fn collect_params(
    doc: &OpenApiDocument,
    path_item: &Map<String, Value>,
    op: &Map<String, Value>,
) -> Result<Vec<ParamDecl>, OpenApiError> {
    let mut params: Vec<ParamDecl> = Vec::new();
    let levels = [path_item.get("parameters"), op.get("parameters")];
    for list in levels.into_iter().flatten().filter_map(Value::as_array) {
        for raw in list {
            let param = doc.resolve(raw)?;
            let (Some(name), Some(location)) = (
                param.get("name").and_then(Value::as_str),
                param.get("in").and_then(Value::as_str),
            ) else {
                continue;
            };
            let mut schema = match param.get("schema") {
                Some(schema) => doc.inline_refs(schema)?,
                None => json!({"type": "string"}),
            };
            if let (Some(description), Some(obj)) = (
                param.get("description").and_then(Value::as_str),
                schema.as_object_mut(),
            ) {
                obj.entry("description")
                    .or_insert_with(|| Value::String(description.to_string()));
            }
            let decl = ParamDecl {
                name: name.to_string(),
                location: location.to_string(),
                required: location == "path"
                    || param.get("required").and_then(Value::as_bool).unwrap_or(false),
                schema,
            };
            // Operation-level parameters override path-level ones.
            params.retain(|p| !(p.name == decl.name && p.location == decl.location));
            params.push(decl);
        }
    }
    Ok(params)
}

struct BodyDecl {
    body: RequestBody,
    properties: Vec<(String, Value)>,
    required: Vec<String>,
}

fn collect_body(doc: &OpenApiDocument, op: &Map<String, Value>) -> Result<BodyDecl, OpenApiError> {
    let empty = BodyDecl {
        body: RequestBody::None,
        properties: Vec::new(),
        required: Vec::new(),
    };
    let Some(raw) = op.get("requestBody") else {
        return Ok(empty);
    };
    let request_body = doc.resolve(raw)?;
    let Some(schema) = request_body.pointer("/content/application~1json/schema") else {
        return Ok(empty);
    };
    let schema = doc.inline_refs(schema)?;
    let body_required = request_body
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        return Ok(BodyDecl {
            body: RequestBody::Object(props.keys().cloned().collect()),
            properties: props.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            required,
        });
    }
    Ok(BodyDecl {
        body: RequestBody::Whole,
        properties: vec![("body".to_string(), schema)],
        required: if body_required {
            vec!["body".to_string()]
        } else {
            Vec::new()
        },
    })
}

fn fallback_name(method: &str, path: &str) -> String {
    let slug: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}", method, slug)
}

fn describe(op: &Map<String, Value>, method: &str, path: &str) -> String {
    let summary = op.get("summary").and_then(Value::as_str).unwrap_or("");
    let detail = op.get("description").and_then(Value::as_str).unwrap_or("");
    let text = match (summary.is_empty(), detail.is_empty()) {
        (false, false) => format!("{}\n\n{}", summary, detail),
        (false, true) => summary.to_string(),
        (true, false) => detail.to_string(),
        (true, true) => String::new(),
    };
    if text.is_empty() {
        format!("{} {}", method.to_ascii_uppercase(), path)
    } else {
        text
    }
}

/// One tool per non-excluded operation of `doc`, each bound to `transport`.
pub fn generate_tools(
    doc: &OpenApiDocument,
    transport: Arc<dyn HttpTransport>,
    exclusions: &[ExcludedRoute],
    logger: &Logger,
) -> Result<Vec<(ToolDef, OpenApiTool)>, OpenApiError> {
    let mut tools = Vec::new();
    let mut seen = HashSet::new();

    for (path, item) in doc.paths() {
        let Some(path_item) = doc.resolve(item)?.as_object() else {
            continue;
        };
        for method in METHODS {
            let Some(op) = path_item.get(*method).and_then(Value::as_object) else {
                continue;
            };
            if is_excluded(exclusions, method, path) {
                logger.debug(&format!("Excluded route {} {}", method.to_ascii_uppercase(), path), None);
                continue;
            }

            let name = op
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| fallback_name(method, path));
            if !seen.insert(name.clone()) {
                return Err(OpenApiError::DuplicateTool(name));
            }

            let params = collect_params(doc, path_item, op)?;
            let body = collect_body(doc, op)?;

            let mut properties = Map::new();
            let mut required = Vec::new();
            for param in &params {
                properties.insert(param.name.clone(), param.schema.clone());
                if param.required {
                    required.push(param.name.clone());
                }
            }
            let mut body_props = Vec::new();
            for (prop, schema) in body.properties {
                if properties.contains_key(&prop) {
                    continue;
                }
                if body.required.contains(&prop) {
                    required.push(prop.clone());
                }
                properties.insert(prop.clone(), schema);
                body_props.push(prop);
            }
            let body_kind = match body.body {
                RequestBody::Object(_) => RequestBody::Object(body_props),
                other => other,
            };

            let mut input_schema = json!({"type": "object", "properties": properties});
            if !required.is_empty() {
                input_schema["required"] = json!(required);
            }

            let method_upper = method.to_ascii_uppercase();
            let operation = Operation {
                name: name.clone(),
                method: Method::from_bytes(method_upper.as_bytes()).unwrap_or(Method::GET),
                path_template: path.clone(),
                path_params: params
                    .iter()
                    .filter(|p| p.location == "path")
                    .map(|p| p.name.clone())
                    .collect(),
                query_params: params
                    .iter()
                    .filter(|p| p.location == "query")
                    .map(|p| (p.name.clone(), p.required))
                    .collect(),
                body: body_kind,
            };

            tools.push((
                ToolDef::new(name, describe(op, method, path), input_schema),
                OpenApiTool {
                    operation,
                    transport: transport.clone(),
                },
            ));
        }
    }

    logger.info(&format!("Generated {} tools from OpenAPI document", tools.len()), None);
    Ok(tools)
}
