//! Shared document types and setup for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use elif_relations::{
    Document, DocumentDefinition, DocumentId, DocumentRegistry, FieldMapping, MemoryStore,
    OnDelete, PropagationMode, RelatedDocument, RelationConfig, RelationConfigBuilder,
    RelationGraph, RelationManager, StoreOptions,
};
use serde::{Deserialize, Serialize};

macro_rules! identity {
    ($name:literal, $index:literal) => {
        fn document_name() -> &'static str {
            $name
        }

        fn index_name() -> &'static str {
            $index
        }

        fn id(&self) -> Option<&DocumentId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: DocumentId) {
            self.id = Some(id);
        }
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub name: String,
}

impl Document for Team {
    identity!("team", "teams");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.field("name", FieldMapping::Text);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub login: String,
}

impl Document for User {
    identity!("user", "users");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub slug: String,
}

impl Document for Label {
    identity!("label", "labels");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub title: String,
    pub team: Option<DocumentId>,
}

impl Document for Project {
    identity!("project", "projects");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .field("title", FieldMapping::Text)
            .relation(
                "team",
                RelatedDocument::to::<Team>().on_delete(OnDelete::Cascade),
                |project| project.team.clone().into(),
            );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub summary: String,
    pub project: Option<DocumentId>,
    pub assignee: Option<DocumentId>,
    pub labels: Option<Vec<DocumentId>>,
}

impl Document for Task {
    identity!("task", "tasks");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .relation(
                "project",
                RelatedDocument::named("project").on_delete(OnDelete::Cascade),
                |task| task.project.clone().into(),
            )
            .relation(
                "assignee",
                RelatedDocument::to::<User>()
                    .on_delete(OnDelete::SetNull)
                    .optional(),
                |task| task.assignee.clone().into(),
            )
            .relation(
                "labels",
                RelatedDocument::to::<Label>()
                    .field_name("slug")
                    .on_delete(OnDelete::SetNull)
                    .optional(),
                |task| task.labels.clone().into(),
            );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub body: String,
    pub task: Option<DocumentId>,
    pub author: Option<DocumentId>,
}

impl Document for Comment {
    identity!("comment", "comments");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .relation("task", RelatedDocument::to::<Task>(), |comment| {
                comment.task.clone().into()
            })
            .relation(
                "author",
                RelatedDocument::to::<User>()
                    .on_delete(OnDelete::Cascade)
                    .optional(),
                |comment| comment.author.clone().into(),
            );
    }
}

/// Cascades back to [`Pong`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ping {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub pong: Option<DocumentId>,
}

impl Document for Ping {
    identity!("ping", "pings");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.relation(
            "pong",
            RelatedDocument::named("pong")
                .on_delete(OnDelete::Cascade)
                .optional(),
            |ping| ping.pong.clone().into(),
        );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pong {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub ping: Option<DocumentId>,
}

impl Document for Pong {
    identity!("pong", "pongs");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.relation(
            "ping",
            RelatedDocument::to::<Ping>()
                .on_delete(OnDelete::Cascade)
                .optional(),
            |pong| pong.ping.clone().into(),
        );
    }
}

pub fn graph() -> Arc<RelationGraph> {
    let graph = RelationGraph::builder()
        .document::<Comment>()
        .document::<Task>()
        .document::<Project>()
        .document::<Team>()
        .document::<User>()
        .document::<Label>()
        .document::<Ping>()
        .document::<Pong>()
        .bind()
        .expect("graph should bind");
    Arc::new(graph)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn manager_with(config: RelationConfig) -> RelationManager<MemoryStore> {
    init_tracing();
    let graph = graph();
    let store = Arc::new(MemoryStore::new());

    let registry = DocumentRegistry::new(graph.clone());
    registry
        .register::<Team>()
        .and_then(|registry| registry.register::<User>())
        .and_then(|registry| registry.register::<Label>())
        .and_then(|registry| registry.register::<Project>())
        .and_then(|registry| registry.register::<Task>())
        .and_then(|registry| registry.register::<Comment>())
        .and_then(|registry| registry.register::<Ping>())
        .and_then(|registry| registry.register::<Pong>())
        .expect("document types should register");
    registry
        .init_all(store.as_ref(), true, &StoreOptions::default())
        .await
        .expect("indices should initialize");

    RelationManager::new(store, graph, config)
}

pub async fn manager() -> RelationManager<MemoryStore> {
    manager_with(RelationConfig::default()).await
}

pub async fn best_effort_manager() -> RelationManager<MemoryStore> {
    let config = RelationConfigBuilder::best_effort()
        .build()
        .expect("Failed to build config");
    assert_eq!(*config.get_propagation(), PropagationMode::BestEffort);
    manager_with(config).await
}

pub fn team(id: &str) -> Team {
    Team {
        id: Some(DocumentId::from(id)),
        name: format!("Team {id}"),
    }
}

pub fn project(id: &str, team: &str) -> Project {
    Project {
        id: Some(DocumentId::from(id)),
        title: format!("Project {id}"),
        team: Some(DocumentId::from(team)),
    }
}

pub fn task(id: &str, project: &str) -> Task {
    Task {
        id: Some(DocumentId::from(id)),
        summary: format!("Task {id}"),
        project: Some(DocumentId::from(project)),
        ..Default::default()
    }
}

pub fn comment(id: &str, task: &str) -> Comment {
    Comment {
        id: Some(DocumentId::from(id)),
        body: "looks good".to_string(),
        task: Some(DocumentId::from(task)),
        author: None,
    }
}
