//! Rust source emission for layout artifacts.
//!
//! Each layout becomes up to three modules in its namespace directory:
//! the column enum, the line record (with its composite key type) and the
//! header record. A `mod.rs` per namespace directory, declaring its records
//! and child namespaces, is written when the batch ends.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::codegen::artifact::{
    EnumArtifact, FieldSpec, KeySpec, LayoutArtifacts, LineCollection, ParentRef, RecordArtifact,
};
use crate::codegen::emitter::{Emitter, RenderedFile};
use crate::codegen::type_resolver::ValueType;
use crate::codegen::utils::{escape_rust_string, namespace_to_path, rust_ident, to_pascal_case, to_snake_case};
use crate::error::Result;

/// Configuration for Rust code generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RustCodegenConfig {
    /// Path of the arbitrary precision decimal type
    pub decimal_type: String,
    /// Path of the calendar date type
    pub date_type: String,
    /// Also derive `serde::Serialize`/`Deserialize` on generated records
    pub derive_serde: bool,
}

impl Default for RustCodegenConfig {
    fn default() -> Self {
        Self {
            decimal_type: "bigdecimal::BigDecimal".to_string(),
            date_type: "chrono::NaiveDate".to_string(),
            derive_serde: false,
        }
    }
}

/// Emits Rust modules.
#[derive(Debug, Clone, Default)]
pub struct RustEmitter {
    pub config: RustCodegenConfig,
}

impl RustEmitter {
    pub fn new(config: RustCodegenConfig) -> Self {
        Self { config }
    }

    fn output_name(&self, namespace: &str, type_name: &str) -> String {
        let file = format!("{}.rs", to_snake_case(type_name));
        match namespace_to_path(namespace) {
            dir if dir.is_empty() => file,
            dir => format!("{}/{}", dir, file),
        }
    }
}

impl Emitter for RustEmitter {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn render(&self, artifacts: &LayoutArtifacts) -> Result<Vec<RenderedFile>> {
        let mut files = Vec::with_capacity(3);

        let mut out = Vec::new();
        generate_column_enum(&mut out, &artifacts.section, &artifacts.column_enum)?;
        files.push(RenderedFile::new(
            self.output_name(&artifacts.namespace, &artifacts.column_enum.name),
            into_string(out)?,
        ));

        if let Some(line) = &artifacts.line {
            let mut out = Vec::new();
            generate_line_module(&mut out, &self.config, &artifacts.section, line)?;
            files.push(RenderedFile::new(
                self.output_name(&artifacts.namespace, &line.name),
                into_string(out)?,
            ));
        }

        let mut out = Vec::new();
        generate_header_module(&mut out, &self.config, &artifacts.section, &artifacts.header)?;
        files.push(RenderedFile::new(
            self.output_name(&artifacts.namespace, &artifacts.header.name),
            into_string(out)?,
        ));

        Ok(files)
    }

    fn finish(&self, generated: &[LayoutArtifacts]) -> Result<Vec<RenderedFile>> {
        let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for artifacts in generated {
            let dir = modules.entry(namespace_to_path(&artifacts.namespace)).or_default();
            dir.push(to_snake_case(&artifacts.column_enum.name));
            if let Some(line) = &artifacts.line {
                dir.push(to_snake_case(&line.name));
            }
            dir.push(to_snake_case(&artifacts.header.name));
        }

        // Every directory below the output root declares its child namespaces.
        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for dir in modules.keys() {
            let mut path = dir.as_str();
            while let Some((parent, child)) = path.rsplit_once('/') {
                children.entry(parent.to_string()).or_default().insert(child.to_string());
                path = parent;
            }
            if !path.is_empty() {
                children.entry(String::new()).or_default().insert(path.to_string());
            }
        }

        let mut dirs: BTreeSet<&String> = modules.keys().collect();
        dirs.extend(children.keys().filter(|dir| !dir.is_empty()));

        let mut files = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let own = modules.get(dir).map(Vec::as_slice).unwrap_or_default();
            let mut out = Vec::new();
            writeln!(out, "// @generated by rifgen. Do not edit.\n")?;
            for module in own {
                writeln!(out, "pub mod {};", module)?;
            }
            for child in children.get(dir).into_iter().flatten() {
                writeln!(out, "pub mod {};", child)?;
            }
            if !own.is_empty() {
                writeln!(out)?;
            }
            for module in own {
                writeln!(out, "pub use {}::*;", module)?;
            }
            let name = match dir.as_str() {
                "" => "mod.rs".to_string(),
                dir => format!("{}/mod.rs", dir),
            };
            files.push(RenderedFile::new(name, into_string(out)?));
        }
        Ok(files)
    }
}

fn into_string(buffer: Vec<u8>) -> io::Result<String> {
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_preamble<W: Write>(writer: &mut W, section: &str) -> io::Result<()> {
    writeln!(
        writer,
        "// @generated by rifgen from layout section `{}`. Do not edit.\n",
        section
    )
}

// ============================================================================
// Type mapping
// ============================================================================

/// Last path segment of a configured type path.
fn short_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn value_type_name<'a>(config: &'a RustCodegenConfig, value: &ValueType) -> &'a str {
    match value {
        ValueType::Char => "char",
        ValueType::Text { .. } => "String",
        ValueType::Date => short_name(&config.date_type),
        ValueType::Decimal { .. } => short_name(&config.decimal_type),
    }
}

/// Values returned by copy rather than by reference.
fn is_copy(value: &ValueType) -> bool {
    matches!(value, ValueType::Char | ValueType::Date)
}

fn storage_type(config: &RustCodegenConfig, value: &ValueType, optional: bool) -> String {
    let name = value_type_name(config, value);
    if optional {
        format!("Option<{}>", name)
    } else {
        name.to_string()
    }
}

/// Return type and body of a getter over `self.<field>`.
fn getter_parts(config: &RustCodegenConfig, value: &ValueType, optional: bool, field: &str) -> (String, String) {
    let name = value_type_name(config, value);
    match (value, optional) {
        (ValueType::Text { .. }, false) => ("&str".to_string(), format!("&self.{}", field)),
        (ValueType::Text { .. }, true) => ("Option<&str>".to_string(), format!("self.{}.as_deref()", field)),
        (value, false) if is_copy(value) => (name.to_string(), format!("self.{}", field)),
        (value, true) if is_copy(value) => (format!("Option<{}>", name), format!("self.{}", field)),
        (_, false) => (format!("&{}", name), format!("&self.{}", field)),
        (_, true) => (format!("Option<&{}>", name), format!("self.{}.as_ref()", field)),
    }
}

/// Imports needed by the value types of a record.
fn write_imports<'a, W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    values: impl Iterator<Item = &'a ValueType>,
) -> io::Result<()> {
    let mut paths = Vec::new();
    for value in values {
        let path = match value {
            ValueType::Date => &config.date_type,
            ValueType::Decimal { .. } => &config.decimal_type,
            _ => continue,
        };
        if path.contains("::") && !paths.contains(path) {
            paths.push(path.clone());
        }
    }
    paths.sort();
    for path in paths {
        writeln!(writer, "use {};", path)?;
    }
    Ok(())
}

fn derives(config: &RustCodegenConfig, base: &str) -> String {
    if config.derive_serde {
        format!("#[derive({}, serde::Serialize, serde::Deserialize)]", base)
    } else {
        format!("#[derive({})]", base)
    }
}

/// Doc line describing the column behind a field.
fn column_doc(field: &FieldSpec) -> String {
    let meta = &field.meta;
    let shape = match (meta.length, meta.precision, meta.scale) {
        (Some(length), _, _) => format!("{}({})", meta.column_type, length),
        (_, Some(precision), Some(scale)) => format!("{}({},{})", meta.column_type, precision, scale),
        _ => meta.column_type.to_string(),
    };
    let mut flags = Vec::new();
    if field.key {
        flags.push("key");
    }
    if meta.nullable {
        flags.push("nullable");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(", {}", flags.join(", "))
    };
    match &field.doc {
        Some(doc) => format!("{} (`{}`: {}{})", doc, meta.name, shape, flags),
        None => format!("`{}`: {}{}", meta.name, shape, flags),
    }
}

// ============================================================================
// Column enum
// ============================================================================

fn variant_name(entry: &str) -> String {
    rust_ident(&to_pascal_case(entry))
}

/// Generate the column enum of a layout.
pub fn generate_column_enum<W: Write>(writer: &mut W, section: &str, artifact: &EnumArtifact) -> io::Result<()> {
    let name = &artifact.name;
    write_preamble(writer, section)?;

    writeln!(writer, "/// Columns of the `{}` layout, in layout order.", section)?;
    writeln!(writer, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]")?;
    writeln!(writer, "pub enum {} {{", name)?;
    for entry in &artifact.entries {
        writeln!(writer, "    /// `{}`", entry)?;
        writeln!(writer, "    {},", variant_name(entry))?;
    }
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl {} {{", name)?;
    writeln!(writer, "    /// Every column, in layout order.")?;
    writeln!(writer, "    pub const ALL: [{}; {}] = [", name, artifact.entries.len())?;
    for entry in &artifact.entries {
        writeln!(writer, "        {}::{},", name, variant_name(entry))?;
    }
    writeln!(writer, "    ];\n")?;

    writeln!(writer, "    /// Symbolic name of the column in the layout.")?;
    writeln!(writer, "    pub const fn name(self) -> &'static str {{")?;
    writeln!(writer, "        match self {{")?;
    for entry in &artifact.entries {
        writeln!(
            writer,
            "            {}::{} => \"{}\",",
            name,
            variant_name(entry),
            escape_rust_string(entry)
        )?;
    }
    writeln!(writer, "        }}")?;
    writeln!(writer, "    }}\n")?;

    writeln!(writer, "    /// 0-based position of the column in the layout.")?;
    writeln!(writer, "    pub const fn index(self) -> usize {{")?;
    writeln!(writer, "        self as usize")?;
    writeln!(writer, "    }}\n")?;

    writeln!(writer, "    /// Look a column up by its symbolic name.")?;
    writeln!(writer, "    pub fn from_name(name: &str) -> Option<Self> {{")?;
    writeln!(writer, "        Self::ALL.iter().copied().find(|column| column.name() == name)")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl std::fmt::Display for {} {{", name)?;
    writeln!(writer, "    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{")?;
    writeln!(writer, "        f.write_str(self.name())")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "}}")?;

    Ok(())
}

// ============================================================================
// Records
// ============================================================================

fn write_accessors<W: Write>(writer: &mut W, config: &RustCodegenConfig, field: &FieldSpec) -> io::Result<()> {
    let ident = rust_ident(&field.name);
    let optional = field.is_optional();
    let (ret, body) = getter_parts(config, &field.storage, optional, &ident);

    writeln!(writer, "    pub fn {}(&self) -> {} {{", ident, ret)?;
    writeln!(writer, "        {}", body)?;
    writeln!(writer, "    }}\n")?;

    writeln!(
        writer,
        "    pub fn set_{}(&mut self, {}: {}) {{",
        field.name,
        ident,
        storage_type(config, &field.storage, optional)
    )?;
    writeln!(writer, "        self.{} = {};", ident, ident)?;
    writeln!(writer, "    }}\n")?;
    Ok(())
}

/// Constructor taking every required field, in field order.
fn write_constructor<W: Write>(
    writer: &mut W,
    required: &[(String, String)],
    fields: &[FieldSpec],
    extra_init: &[(&str, &str)],
) -> io::Result<()> {
    let params: Vec<String> = required
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, ty))
        .collect();
    writeln!(writer, "    pub fn new({}) -> Self {{", params.join(", "))?;
    writeln!(writer, "        Self {{")?;
    for (name, _) in required.iter().filter(|(name, _)| !fields.iter().any(|f| rust_ident(&f.name) == *name)) {
        writeln!(writer, "            {},", name)?;
    }
    for field in fields {
        let ident = rust_ident(&field.name);
        if field.is_optional() {
            writeln!(writer, "            {}: None,", ident)?;
        } else {
            writeln!(writer, "            {},", ident)?;
        }
    }
    for (name, init) in extra_init {
        writeln!(writer, "            {}: {},", name, init)?;
    }
    writeln!(writer, "        }}")?;
    writeln!(writer, "    }}\n")?;
    Ok(())
}

fn required_params(config: &RustCodegenConfig, fields: &[FieldSpec]) -> Vec<(String, String)> {
    fields
        .iter()
        .filter(|field| !field.is_optional())
        .map(|field| (rust_ident(&field.name), storage_type(config, &field.storage, false)))
        .collect()
}

fn write_fields<W: Write>(writer: &mut W, config: &RustCodegenConfig, fields: &[FieldSpec]) -> io::Result<()> {
    for field in fields {
        writeln!(writer, "    /// {}", column_doc(field))?;
        writeln!(
            writer,
            "    {}: {},",
            rust_ident(&field.name),
            storage_type(config, &field.storage, field.is_optional())
        )?;
    }
    Ok(())
}

fn write_key_type<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    line: &RecordArtifact,
    key: &KeySpec,
) -> io::Result<()> {
    let parent = rust_ident(&key.parent.name);
    let number = rust_ident(&key.line_number.name);
    let parent_ty = storage_type(config, &key.parent.value, false);
    let number_ty = storage_type(config, &key.line_number.value, false);

    writeln!(
        writer,
        "/// Composite key of [`{}`]: the owning header's id and the line number.",
        line.name
    )?;
    writeln!(writer, "///")?;
    writeln!(writer, "/// Equality and hashing cover exactly these two parts.")?;
    writeln!(writer, "{}", derives(config, "Debug, Clone, PartialEq, Eq, Hash"))?;
    writeln!(writer, "pub struct {} {{", key.name)?;
    writeln!(writer, "    {}: {},", parent, parent_ty)?;
    writeln!(writer, "    {}: {},", number, number_ty)?;
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl {} {{", key.name)?;
    writeln!(writer, "    pub fn new({}: {}, {}: {}) -> Self {{", parent, parent_ty, number, number_ty)?;
    writeln!(writer, "        Self {{ {}, {} }}", parent, number)?;
    writeln!(writer, "    }}\n")?;
    for part in [&key.parent, &key.line_number] {
        let ident = rust_ident(&part.name);
        let (ret, body) = getter_parts(config, &part.value, false, &ident);
        writeln!(writer, "    pub fn {}(&self) -> {} {{", ident, ret)?;
        writeln!(writer, "        {}", body)?;
        writeln!(writer, "    }}\n")?;
    }
    writeln!(writer, "}}\n")?;
    Ok(())
}

/// Generate the module of a line record and its key type.
pub fn generate_line_module<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    section: &str,
    line: &RecordArtifact,
) -> io::Result<()> {
    let (Some(key), Some(parent)) = (&line.key, &line.parent) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("line record '{}' has no key", line.name),
        ));
    };

    write_preamble(writer, section)?;
    writeln!(writer, "use std::hash::{{Hash, Hasher}};\n")?;
    write_imports(
        writer,
        config,
        line.fields.iter().map(|field| &field.storage).chain(std::iter::once(&parent.value)),
    )?;
    writeln!(writer)?;

    write_key_type(writer, config, line, key)?;
    write_line_struct(writer, config, line, key, parent)
}

fn write_line_struct<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    line: &RecordArtifact,
    key: &KeySpec,
    parent: &ParentRef,
) -> io::Result<()> {
    let parent_ident = rust_ident(&parent.field);
    let number_ident = rust_ident(&key.line_number.name);
    let parent_ty = storage_type(config, &parent.value, false);

    writeln!(
        writer,
        "/// Line record of [`{}`](super::{}::{}), stored in `{}`.",
        parent.header_type,
        to_snake_case(&parent.header_type),
        parent.header_type,
        line.table
    )?;
    writeln!(writer, "///")?;
    writeln!(
        writer,
        "/// Two lines are equal when their keys ([`{}`]) are equal.",
        key.name
    )?;
    writeln!(writer, "{}", derives(config, "Debug, Clone"))?;
    writeln!(writer, "pub struct {} {{", line.name)?;
    writeln!(
        writer,
        "    /// `{}` of the owning `{}`",
        parent.header_id_field, parent.header_type
    )?;
    writeln!(writer, "    {}: {},", parent_ident, parent_ty)?;
    write_fields(writer, config, &line.fields)?;
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl {} {{", line.name)?;
    writeln!(writer, "    pub const TABLE_NAME: &'static str = \"{}\";\n", escape_rust_string(&line.table))?;

    let mut required = vec![(parent_ident.clone(), parent_ty.clone())];
    required.extend(required_params(config, &line.fields));
    write_constructor(writer, &required, &line.fields, &[])?;

    writeln!(writer, "    pub fn key(&self) -> {} {{", key.name)?;
    writeln!(
        writer,
        "        {}::new(self.{}.clone(), self.{}.clone())",
        key.name, parent_ident, number_ident
    )?;
    writeln!(writer, "    }}\n")?;

    let (ret, body) = getter_parts(config, &parent.value, false, &parent_ident);
    writeln!(writer, "    pub fn {}(&self) -> {} {{", parent_ident, ret)?;
    writeln!(writer, "        {}", body)?;
    writeln!(writer, "    }}\n")?;
    writeln!(writer, "    pub fn set_{}(&mut self, {}: {}) {{", parent.field, parent_ident, parent_ty)?;
    writeln!(writer, "        self.{} = {};", parent_ident, parent_ident)?;
    writeln!(writer, "    }}\n")?;

    for field in &line.fields {
        write_accessors(writer, config, field)?;
    }
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl PartialEq for {} {{", line.name)?;
    writeln!(writer, "    fn eq(&self, other: &Self) -> bool {{")?;
    writeln!(
        writer,
        "        self.{p} == other.{p} && self.{n} == other.{n}",
        p = parent_ident,
        n = number_ident
    )?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "}}\n")?;
    writeln!(writer, "impl Eq for {} {{}}\n", line.name)?;

    writeln!(writer, "impl Hash for {} {{", line.name)?;
    writeln!(writer, "    fn hash<H: Hasher>(&self, state: &mut H) {{")?;
    writeln!(writer, "        self.{}.hash(state);", parent_ident)?;
    writeln!(writer, "        self.{}.hash(state);", number_ident)?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "}}")?;
    Ok(())
}

/// Generate the module of a header record.
pub fn generate_header_module<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    section: &str,
    header: &RecordArtifact,
) -> io::Result<()> {
    write_preamble(writer, section)?;
    let line_number = header.lines.iter().map(|lines| &lines.order_by_value);
    write_imports(writer, config, header.fields.iter().map(|field| &field.storage).chain(line_number))?;
    if let Some(lines) = &header.lines {
        writeln!(writer, "\nuse super::{}::{};", to_snake_case(&lines.line_type), lines.line_type)?;
    }
    writeln!(writer)?;

    writeln!(writer, "/// Header record of the `{}` layout, stored in `{}`.", section, header.table)?;
    if let Some(lines) = &header.lines {
        writeln!(writer, "///")?;
        writeln!(
            writer,
            "/// Owns its [`{}`] records, kept in ascending `{}` order.",
            lines.line_type, lines.order_by
        )?;
    }
    writeln!(writer, "{}", derives(config, "Debug, Clone, PartialEq, Eq"))?;
    writeln!(writer, "pub struct {} {{", header.name)?;
    write_fields(writer, config, &header.fields)?;
    if let Some(lines) = &header.lines {
        writeln!(writer, "    /// Line records, ascending by `{}`", lines.order_by)?;
        writeln!(writer, "    {}: Vec<{}>,", rust_ident(&lines.field), lines.line_type)?;
    }
    writeln!(writer, "}}\n")?;

    writeln!(writer, "impl {} {{", header.name)?;
    writeln!(writer, "    pub const TABLE_NAME: &'static str = \"{}\";\n", escape_rust_string(&header.table))?;

    let required = required_params(config, &header.fields);
    let lines_init = header
        .lines
        .as_ref()
        .map(|lines| vec![(lines.field.as_str(), "Vec::new()")])
        .unwrap_or_default();
    write_constructor(writer, &required, &header.fields, &lines_init)?;

    for field in &header.fields {
        match (&header.lines, header.id_field.as_deref()) {
            (Some(lines), Some(id)) if field.name == id => write_id_accessors(writer, config, field, lines)?,
            _ => write_accessors(writer, config, field)?,
        }
    }

    if let Some(lines) = &header.lines {
        let id = header.id_field.as_deref().unwrap_or_default();
        write_line_collection(writer, config, lines, &rust_ident(id))?;
    }
    writeln!(writer, "}}")?;
    Ok(())
}

/// Id accessors of a header with lines: setting the id re-stamps every line.
fn write_id_accessors<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    field: &FieldSpec,
    lines: &LineCollection,
) -> io::Result<()> {
    let ident = rust_ident(&field.name);
    let (ret, body) = getter_parts(config, &field.storage, false, &ident);

    writeln!(writer, "    pub fn {}(&self) -> {} {{", ident, ret)?;
    writeln!(writer, "        {}", body)?;
    writeln!(writer, "    }}\n")?;

    writeln!(
        writer,
        "    pub fn set_{}(&mut self, {}: {}) {{",
        field.name,
        ident,
        storage_type(config, &field.storage, false)
    )?;
    writeln!(writer, "        for line in &mut self.{} {{", rust_ident(&lines.field))?;
    writeln!(writer, "            line.set_{}({}.clone());", lines.parent_field, ident)?;
    writeln!(writer, "        }}")?;
    writeln!(writer, "        self.{} = {};", ident, ident)?;
    writeln!(writer, "    }}\n")?;
    Ok(())
}

fn write_line_collection<W: Write>(
    writer: &mut W,
    config: &RustCodegenConfig,
    lines: &LineCollection,
    id_ident: &str,
) -> io::Result<()> {
    let field = rust_ident(&lines.field);
    let order_by = rust_ident(&lines.order_by);
    let (number_ty, _) = getter_parts(config, &lines.order_by_value, false, &order_by);

    writeln!(writer, "    /// Line records, ascending by `{}`.", lines.order_by)?;
    writeln!(writer, "    pub fn {}(&self) -> &[{}] {{", field, lines.line_type)?;
    writeln!(writer, "        &self.{}", field)?;
    writeln!(writer, "    }}\n")?;

    writeln!(writer, "    /// Add a line owned by this record.")?;
    writeln!(writer, "    ///")?;
    writeln!(
        writer,
        "    /// The line's `{}` is set to this record's id. A line with the same",
        lines.parent_field
    )?;
    writeln!(writer, "    /// `{}` is replaced and returned.", lines.order_by)?;
    writeln!(
        writer,
        "    pub fn add_line(&mut self, mut line: {}) -> Option<{}> {{",
        lines.line_type, lines.line_type
    )?;
    writeln!(writer, "        line.set_{}(self.{}.clone());", lines.parent_field, id_ident)?;
    writeln!(writer, "        match self")?;
    writeln!(writer, "            .{}", field)?;
    writeln!(
        writer,
        "            .binary_search_by(|existing| existing.{o}().cmp(&line.{o}()))",
        o = order_by
    )?;
    writeln!(writer, "        {{")?;
    writeln!(
        writer,
        "            Ok(position) => Some(std::mem::replace(&mut self.{}[position], line)),",
        field
    )?;
    writeln!(writer, "            Err(position) => {{")?;
    writeln!(writer, "                self.{}.insert(position, line);", field)?;
    writeln!(writer, "                None")?;
    writeln!(writer, "            }}")?;
    writeln!(writer, "        }}")?;
    writeln!(writer, "    }}\n")?;

    writeln!(writer, "    /// Remove and return the line with the given `{}`.", lines.order_by)?;
    writeln!(
        writer,
        "    pub fn remove_line(&mut self, {}: {}) -> Option<{}> {{",
        order_by, number_ty, lines.line_type
    )?;
    writeln!(
        writer,
        "        let position = self.{}.iter().position(|existing| existing.{}() == {})?;",
        field, order_by, order_by
    )?;
    writeln!(writer, "        Some(self.{}.remove(position))", field)?;
    writeln!(writer, "    }}\n")?;

    writeln!(writer, "    pub fn clear_lines(&mut self) {{")?;
    writeln!(writer, "        self.{}.clear();", field)?;
    writeln!(writer, "    }}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::entity_codegen::generate_layout;
    use crate::codegen::mapping_spec::MappingSpec;
    use crate::layout::{ColumnDefinition, ColumnType, LayoutSchema};

    fn claim_artifacts() -> LayoutArtifacts {
        let schema = LayoutSchema::new(
            "Carrier",
            vec![
                ColumnDefinition::new("claimId", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("claimType", ColumnType::Character, 1).optional(),
                ColumnDefinition::new("lineNumber", ColumnType::Numeric, 2).with_scale(0),
                ColumnDefinition::new("amount", ColumnType::Numeric, 10).with_scale(2).optional(),
                ColumnDefinition::new("serviceDate", ColumnType::Date, 8),
                ColumnDefinition::new("type", ColumnType::Character, 4).optional(),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new("bluebutton::rif", "Carrier")
            .with_header_type("CarrierClaim")
            .with_header_table("CarrierClaims")
            .with_header_id("claimId")
            .with_lines("CarrierClaimLines")
            .with_line_number("lineNumber");
        generate_layout(&schema, &spec).unwrap()
    }

    #[test]
    fn test_render_order_and_names() {
        let files = RustEmitter::default().render(&claim_artifacts()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "bluebutton/rif/carrier_claim_column.rs",
                "bluebutton/rif/carrier_claim_line.rs",
                "bluebutton/rif/carrier_claim.rs",
            ]
        );
    }

    #[test]
    fn test_column_enum_source() {
        let files = RustEmitter::default().render(&claim_artifacts()).unwrap();
        let code = &files[0].contents;

        assert!(code.contains("pub enum CarrierClaimColumn {"));
        assert!(code.contains("pub const ALL: [CarrierClaimColumn; 6] = ["));
        assert!(code.contains("CarrierClaimColumn::ClaimId => \"CLAIM_ID\","));
        assert!(code.contains("CarrierClaimColumn::Type => \"TYPE\","));
        let claim = code.find("    ClaimId,").unwrap();
        let line = code.find("    LineNumber,").unwrap();
        let date = code.find("    ServiceDate,").unwrap();
        assert!(claim < line && line < date);
    }

    #[test]
    fn test_line_source() {
        let files = RustEmitter::default().render(&claim_artifacts()).unwrap();
        let code = &files[1].contents;

        assert!(code.contains("use bigdecimal::BigDecimal;"));
        assert!(code.contains("use chrono::NaiveDate;"));
        assert!(code.contains("#[derive(Debug, Clone, PartialEq, Eq, Hash)]\npub struct CarrierClaimLineId {"));
        assert!(code.contains("    parent_claim: BigDecimal,\n    line_number: BigDecimal,\n}"));
        assert!(code.contains("pub struct CarrierClaimLine {"));
        assert!(code.contains("    amount: Option<BigDecimal>,"));
        assert!(code.contains("    r#type: Option<String>,"));
        assert!(code.contains("pub fn amount(&self) -> Option<&BigDecimal> {\n        self.amount.as_ref()"));
        assert!(code.contains("pub fn r#type(&self) -> Option<&str> {\n        self.r#type.as_deref()"));
        assert!(code.contains("pub fn set_type(&mut self, r#type: Option<String>)"));
        assert!(code.contains("pub fn service_date(&self) -> NaiveDate {"));
        assert!(code.contains(
            "pub fn new(parent_claim: BigDecimal, line_number: BigDecimal, service_date: NaiveDate) -> Self"
        ));
        assert!(code.contains("pub const TABLE_NAME: &'static str = \"CarrierClaimLines\";"));
        assert!(code.contains("self.parent_claim == other.parent_claim && self.line_number == other.line_number"));
        assert!(!code.contains("claim_type"));
    }

    #[test]
    fn test_header_source() {
        let files = RustEmitter::default().render(&claim_artifacts()).unwrap();
        let code = &files[2].contents;

        assert!(code.contains("use super::carrier_claim_line::CarrierClaimLine;"));
        assert!(code.contains("pub struct CarrierClaim {"));
        assert!(code.contains("    claim_id: BigDecimal,"));
        assert!(code.contains("    claim_type: Option<char>,"));
        assert!(code.contains("    lines: Vec<CarrierClaimLine>,"));
        assert!(code.contains("pub fn claim_type(&self) -> Option<char> {\n        self.claim_type\n"));
        assert!(code.contains("pub fn new(claim_id: BigDecimal) -> Self"));
        assert!(code.contains("line.set_parent_claim(self.claim_id.clone());"));
        assert!(code.contains("pub fn remove_line(&mut self, line_number: &BigDecimal)"));
        assert!(!code.contains("amount"));
    }

    #[test]
    fn test_header_only_layout_has_no_line_module() {
        let schema = LayoutSchema::new(
            "Beneficiary",
            vec![
                ColumnDefinition::new("id", ColumnType::Numeric, 9).with_scale(0),
                ColumnDefinition::new("name", ColumnType::Character, 20).optional(),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new("", "Beneficiary").with_header_id("id");
        let files = RustEmitter::default()
            .render(&generate_layout(&schema, &spec).unwrap())
            .unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["beneficiary_column.rs", "beneficiary.rs"]);
        assert!(files[1].contents.contains("pub fn name(&self) -> Option<&str>"));
        assert!(!files[1].contents.contains("lines"));
    }

    #[test]
    fn test_finish_writes_namespace_modules() {
        let files = RustEmitter::default().finish(&[claim_artifacts()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["bluebutton/mod.rs", "bluebutton/rif/mod.rs"]);
        assert!(files[0].contents.contains("pub mod rif;\n"));
        assert!(!files[0].contents.contains("pub use"));

        let code = &files[1].contents;
        assert!(code.contains(
            "pub mod carrier_claim_column;\npub mod carrier_claim_line;\npub mod carrier_claim;\n"
        ));
        assert!(code.contains("pub use carrier_claim::*;"));
    }

    fn numbered_layout(namespace: &str, section: &str) -> LayoutArtifacts {
        let schema = LayoutSchema::new(
            section,
            vec![
                ColumnDefinition::new("id", ColumnType::Character, 5),
                ColumnDefinition::new("line", ColumnType::Numeric, 3).with_scale(0),
                ColumnDefinition::new("amt", ColumnType::Numeric, 5).with_scale(2).optional(),
            ],
        )
        .unwrap();
        let spec = MappingSpec::new(namespace, section)
            .with_header_id("id")
            .with_lines(format!("{}Lines", section))
            .with_line_number("line");
        generate_layout(&schema, &spec).unwrap()
    }

    #[test]
    fn test_nested_namespaces_are_declared_by_parent() {
        let files = RustEmitter::default()
            .finish(&[numbered_layout("ns", "Alpha"), numbered_layout("ns::inner", "Beta")])
            .unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ns/mod.rs", "ns/inner/mod.rs"]);

        let parent = &files[0].contents;
        assert!(parent.contains("pub mod alpha_column;\npub mod alpha_line;\npub mod alpha;\npub mod inner;\n"));
        assert!(!parent.contains("pub use inner::*;"));
        assert!(files[1].contents.contains("pub mod beta;"));
        assert!(!files[1].contents.contains("pub mod inner;"));
    }

    #[test]
    fn test_header_imports_line_number_type() {
        let files = RustEmitter::default().render(&numbered_layout("ns", "Alpha")).unwrap();
        let header = &files[2].contents;

        assert!(header.contains("use bigdecimal::BigDecimal;"));
        assert!(header.contains("pub fn remove_line(&mut self, line: &BigDecimal) -> Option<AlphaLine>"));
        assert!(header.contains(".position(|existing| existing.line() == line)?;"));
    }

    #[test]
    fn test_serde_derives() {
        let emitter = RustEmitter::new(RustCodegenConfig {
            derive_serde: true,
            ..Default::default()
        });
        let files = emitter.render(&claim_artifacts()).unwrap();
        assert!(files[2]
            .contents
            .contains("#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]"));
    }
}
