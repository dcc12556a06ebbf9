//! Structural declaration counting via tree-sitter.

use semgit_core::StructuralStats;
use tree_sitter::{Node, Parser};

/// Count Java declarations in `source`.
///
/// Never fails: grammar-load or parse problems yield all-zero stats, so a
/// malformed file degrades the pipeline instead of aborting it. Tree-sitter
/// is error-tolerant, so partially broken sources still contribute the
/// declarations it can recognize.
///
/// # Examples
///
/// ```
/// use semgit_semantic::structural_stats;
///
/// let stats = structural_stats("class A { int x; void m() {} }");
/// assert_eq!(stats.types, 1);
/// assert_eq!(stats.methods, 1);
/// assert_eq!(stats.fields, 1);
///
/// assert_eq!(structural_stats(""), Default::default());
/// ```
pub fn structural_stats(source: &str) -> StructuralStats {
    let mut parser = Parser::new();
    if parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .is_err()
    {
        return StructuralStats::default();
    }
    let Some(tree) = parser.parse(source, None) else {
        return StructuralStats::default();
    };

    let mut stats = StructuralStats::default();
    collect_declarations(tree.root_node(), &mut stats);
    stats
}

fn collect_declarations(node: Node, stats: &mut StructuralStats) {
    match node.kind() {
        "class_declaration" => stats.types += 1,
        "interface_declaration" => stats.interfaces += 1,
        "enum_declaration" => stats.enums += 1,
        "method_declaration" | "constructor_declaration" => stats.methods += 1,
        "field_declaration" => stats.fields += 1,
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_declarations(child, stats);
    }
}
