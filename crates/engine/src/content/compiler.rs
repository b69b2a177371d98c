use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::debug;

use crate::world::Category;

use super::database::{Taxonomy, TypeDef, TypeDefId};
use super::discovery::{discover_override_sources, BUILTIN_SOURCE_ID};

const BUILTIN_TAXONOMY_PATH: &str = "assets/base/taxonomy.xml";
const BUILTIN_TAXONOMY_XML: &str = include_str!("../../../../assets/base/taxonomy.xml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInSource,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub source_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (source={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.source_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (source={}, file={})",
                self.code,
                self.message,
                self.source_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
struct PendingTypeDef {
    type_name: String,
    category: Category,
}

pub fn compile_builtin_taxonomy() -> Result<Taxonomy, ContentCompileError> {
    compile_taxonomy(&[])
}

/// Compiles the built-in taxonomy followed by every `*.xml` file under each
/// override directory. A type redefined by a later source replaces the earlier
/// definition.
pub fn compile_taxonomy(override_dirs: &[PathBuf]) -> Result<Taxonomy, ContentCompileError> {
    let mut merged = BTreeMap::<String, PendingTypeDef>::new();

    let builtin = parse_defs_document(
        BUILTIN_SOURCE_ID,
        Path::new(BUILTIN_TAXONOMY_PATH),
        BUILTIN_TAXONOMY_XML,
    )?;
    merge_source(
        &mut merged,
        BUILTIN_SOURCE_ID,
        Path::new(BUILTIN_TAXONOMY_PATH),
        builtin,
        &mut HashSet::new(),
    )?;

    for source in discover_override_sources(override_dirs)? {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.source_id, error.path, error.source))?;
        let mut seen_in_source = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file).map_err(|source_err| {
                read_error(&source.source_id, xml_file.clone(), source_err)
            })?;
            let defs = parse_defs_document(&source.source_id, &xml_file, &raw)?;
            merge_source(
                &mut merged,
                &source.source_id,
                &xml_file,
                defs,
                &mut seen_in_source,
            )?;
        }
        debug!(
            source = %source.source_id,
            load_index = source.load_index,
            "taxonomy_override_merged"
        );
    }

    let type_defs = merged
        .into_values()
        .map(|def| TypeDef {
            id: TypeDefId(0),
            type_name: def.type_name,
            category: def.category,
        })
        .collect::<Vec<_>>();

    Ok(Taxonomy::from_type_defs(type_defs))
}

fn merge_source(
    merged: &mut BTreeMap<String, PendingTypeDef>,
    source_id: &str,
    file_path: &Path,
    defs: Vec<PendingTypeDef>,
    seen_in_source: &mut HashSet<String>,
) -> Result<(), ContentCompileError> {
    for def in defs {
        if !seen_in_source.insert(def.type_name.clone()) {
            return Err(ContentCompileError {
                code: ContentErrorCode::DuplicateDefInSource,
                message: format!(
                    "duplicate TypeDef '{}' in source '{}'; each source may define a typeName only once",
                    def.type_name, source_id
                ),
                source_id: source_id.to_string(),
                file_path: file_path.to_path_buf(),
                location: None,
            });
        }
        merged.insert(def.type_name.clone(), def);
    }
    Ok(())
}

fn parse_defs_document(
    source_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<PendingTypeDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        source_id: source_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            source_id,
            file_path,
            &doc,
            root,
        ));
    }

    let mut defs = Vec::<PendingTypeDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "TypeDef" {
            return Err(error_at_node(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <TypeDef> is recognized",
                    child.tag_name().name()
                ),
                source_id,
                file_path,
                &doc,
                child,
            ));
        }
        defs.push(parse_type_def(source_id, file_path, &doc, child)?);
    }

    Ok(defs)
}

fn parse_type_def(
    source_id: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<PendingTypeDef, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut type_name: Option<String> = None;
    let mut category: Option<Category> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <TypeDef>", field_name),
                source_id,
                file_path,
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "typeName" => {
                let value = required_text(source_id, file_path, doc, field, "typeName")?;
                if !is_valid_type_name(&value) {
                    return Err(error_at_node(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "typeName '{}' must be a single lowercase word (a-z, _)",
                            value
                        ),
                        source_id,
                        file_path,
                        doc,
                        field,
                    ));
                }
                type_name = Some(value);
            }
            "category" => {
                let value = required_text(source_id, file_path, doc, field, "category")?;
                let parsed = Category::from_token(&value).ok_or_else(|| {
                    error_at_node(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "invalid category '{}'; allowed values: {}",
                            value,
                            Category::ALL
                                .iter()
                                .map(|category| category.as_token())
                                .collect::<Vec<_>>()
                                .join("|")
                        ),
                        source_id,
                        file_path,
                        doc,
                        field,
                    )
                })?;
                category = Some(parsed);
            }
            _ => {
                return Err(error_at_node(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <TypeDef>", field_name),
                    source_id,
                    file_path,
                    doc,
                    field,
                ))
            }
        }
    }

    let Some(type_name) = type_name else {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            "missing required field <typeName> in <TypeDef>".to_string(),
            source_id,
            file_path,
            doc,
            node,
        ));
    };
    let Some(category) = category else {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            "missing required field <category> in <TypeDef>".to_string(),
            source_id,
            file_path,
            doc,
            node,
        ));
    };

    Ok(PendingTypeDef {
        type_name,
        category,
    })
}

fn is_valid_type_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch == '_')
}

fn required_text(
    source_id: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            format!("field <{}> must not be empty", field_name),
            source_id,
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: ContentErrorCode,
    message: String,
    source_id: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ContentCompileError {
    let pos = doc.text_pos_at(node.range().start);
    ContentCompileError {
        code,
        message,
        source_id: source_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(source_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        source_id: source_id.to_string(),
        file_path: path,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(raw: &str) -> Result<Vec<PendingTypeDef>, ContentCompileError> {
        parse_defs_document("test", Path::new("test.xml"), raw)
    }

    #[test]
    fn parses_type_defs() {
        let defs = parse(
            "<Defs><TypeDef><typeName>cow</typeName><category>small_herbivore</category></TypeDef></Defs>",
        )
        .expect("defs");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].type_name, "cow");
        assert_eq!(defs[0].category, Category::SmallHerbivore);
    }

    #[test]
    fn rejects_wrong_root() {
        let error = parse("<Things/>").expect_err("root");
        assert_eq!(error.code, ContentErrorCode::InvalidRoot);
        assert_eq!(error.location.map(|loc| loc.line), Some(1));
    }

    #[test]
    fn rejects_unknown_category_with_location() {
        let error = parse(
            "<Defs>\n  <TypeDef><typeName>cow</typeName><category>dragon</category></TypeDef>\n</Defs>",
        )
        .expect_err("category");
        assert_eq!(error.code, ContentErrorCode::InvalidValue);
        assert_eq!(error.location.map(|loc| loc.line), Some(2));
        assert!(error.message.contains("dragon"));
    }

    #[test]
    fn rejects_multi_word_type_names() {
        let error = parse(
            "<Defs><TypeDef><typeName>polar bear</typeName><category>big_carnivore</category></TypeDef></Defs>",
        )
        .expect_err("type name");
        assert_eq!(error.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn reports_missing_and_duplicate_fields() {
        let missing = parse("<Defs><TypeDef><typeName>cow</typeName></TypeDef></Defs>")
            .expect_err("missing");
        assert_eq!(missing.code, ContentErrorCode::MissingField);

        let duplicate = parse(
            "<Defs><TypeDef><typeName>cow</typeName><typeName>pig</typeName></TypeDef></Defs>",
        )
        .expect_err("duplicate");
        assert_eq!(duplicate.code, ContentErrorCode::DuplicateField);

        let unknown = parse("<Defs><TypeDef><legs>4</legs></TypeDef></Defs>").expect_err("unknown");
        assert_eq!(unknown.code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn malformed_xml_is_reported() {
        let error = parse("<Defs><TypeDef>").expect_err("malformed");
        assert_eq!(error.code, ContentErrorCode::XmlMalformed);
    }

    #[test]
    fn override_directory_adds_and_replaces_types() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("farm");
        fs::create_dir_all(&dir).expect("create");
        fs::write(
            dir.join("extra.xml"),
            "<Defs>\
               <TypeDef><typeName>llama</typeName><category>big_herbivore</category></TypeDef>\
               <TypeDef><typeName>chair</typeName><category>supply</category></TypeDef>\
             </Defs>",
        )
        .expect("write");

        let taxonomy = compile_taxonomy(&[dir]).expect("compile");
        assert_eq!(taxonomy.category_of("llama"), Some(Category::BigHerbivore));
        assert_eq!(taxonomy.category_of("chair"), Some(Category::Supply));
        assert_eq!(taxonomy.len(), 177);
    }

    #[test]
    fn duplicate_within_one_source_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("dup");
        fs::create_dir_all(&dir).expect("create");
        let def = "<Defs><TypeDef><typeName>llama</typeName><category>big_herbivore</category></TypeDef></Defs>";
        fs::write(dir.join("a.xml"), def).expect("write a");
        fs::write(dir.join("b.xml"), def).expect("write b");

        let error = compile_taxonomy(&[dir]).expect_err("duplicate");
        assert_eq!(error.code, ContentErrorCode::DuplicateDefInSource);
        assert_eq!(error.source_id, "dup");
    }
}
