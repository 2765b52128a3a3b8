//! Document types shared by unit tests

use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId};
use crate::mapping::FieldMapping;
use crate::relations::{DocumentDefinition, OnDelete, RelatedDocument, RelationGraph};

macro_rules! document_identity {
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
pub struct Author {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub name: String,
}

impl Document for Author {
    document_identity!("author", "authors");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.field("name", FieldMapping::Text);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub name: String,
}

impl Document for Publisher {
    document_identity!("publisher", "publishers");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub title: String,
    pub author: Option<DocumentId>,
    pub co_authors: Option<Vec<DocumentId>>,
    pub publisher: Option<DocumentId>,
}

impl Document for Book {
    document_identity!("book", "books");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .field("title", FieldMapping::Text)
            .relation(
                "author",
                RelatedDocument::to::<Author>().on_delete(OnDelete::Cascade),
                |book| book.author.clone().into(),
            )
            .relation(
                "co_authors",
                RelatedDocument::to::<Author>()
                    .on_delete(OnDelete::SetNull)
                    .optional(),
                |book| book.co_authors.clone().into(),
            )
            .relation(
                "publisher",
                RelatedDocument::named("publisher")
                    .storage_type(FieldMapping::Text)
                    .optional(),
                |book| book.publisher.clone().into(),
            );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub book: Option<DocumentId>,
    pub stars: u8,
}

impl Document for Review {
    document_identity!("review", "reviews");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .field("stars", FieldMapping::Integer)
            .relation("book", RelatedDocument::named("book"), |review| {
                review.book.clone().into()
            });
    }
}

/// Index name matching every index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scratch {
    #[serde(skip)]
    pub id: Option<DocumentId>,
}

impl Document for Scratch {
    document_identity!("scratch", "*");
}

/// Never bound in the fixture graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stray {
    #[serde(skip)]
    pub id: Option<DocumentId>,
}

impl Document for Stray {
    document_identity!("stray", "strays");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shelf {
    #[serde(skip)]
    pub id: Option<DocumentId>,
}

impl Document for Shelf {
    document_identity!("shelf", "shelves");
}

/// Removed with its shelf
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bin {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub shelf: Option<DocumentId>,
}

impl Document for Bin {
    document_identity!("bin", "bins");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.relation(
            "shelf",
            RelatedDocument::to::<Shelf>().on_delete(OnDelete::Cascade),
            |bin| bin.shelf.clone().into(),
        );
    }
}

/// Blocks its shelf but goes away with its bin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub shelf: Option<DocumentId>,
    pub bin: Option<DocumentId>,
}

impl Document for Item {
    document_identity!("item", "items");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition
            .relation("shelf", RelatedDocument::to::<Shelf>(), |item| {
                item.shelf.clone().into()
            })
            .relation(
                "bin",
                RelatedDocument::to::<Bin>()
                    .on_delete(OnDelete::Cascade)
                    .optional(),
                |item| item.bin.clone().into(),
            );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Edition {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub isbn: u64,
}

impl Document for Edition {
    document_identity!("edition", "editions");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.field("isbn", FieldMapping::Long);
    }
}

/// References editions by isbn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub editions: Option<Vec<DocumentId>>,
}

impl Document for Citation {
    document_identity!("citation", "citations");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.relation(
            "editions",
            RelatedDocument::to::<Edition>()
                .field_name("isbn")
                .on_delete(OnDelete::SetNull)
                .optional(),
            |citation| citation.editions.clone().into(),
        );
    }
}

/// Clears a required relation on delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(skip)]
    pub id: Option<DocumentId>,
    pub book: Option<DocumentId>,
}

impl Document for Bookmark {
    document_identity!("bookmark", "bookmarks");

    fn define(definition: &mut DocumentDefinition<Self>) {
        definition.relation(
            "book",
            RelatedDocument::to::<Book>().on_delete(OnDelete::SetNull),
            |bookmark| bookmark.book.clone().into(),
        );
    }
}

pub fn catalog_graph() -> RelationGraph {
    let result = RelationGraph::builder()
        .document::<Citation>()
        .document::<Edition>()
        .bind();
    match result {
        Ok(graph) => graph,
        Err(err) => panic!("catalog graph failed to bind: {err}"),
    }
}

pub fn shelving_graph() -> RelationGraph {
    let result = RelationGraph::builder()
        .document::<Item>()
        .document::<Bin>()
        .document::<Shelf>()
        .bind();
    match result {
        Ok(graph) => graph,
        Err(err) => panic!("shelving graph failed to bind: {err}"),
    }
}

pub fn fixture_graph() -> RelationGraph {
    let result = RelationGraph::builder()
        .document::<Author>()
        .document::<Publisher>()
        .document::<Book>()
        .document::<Review>()
        .document::<Scratch>()
        .bind();
    match result {
        Ok(graph) => graph,
        Err(err) => panic!("fixture graph failed to bind: {err}"),
    }
}
