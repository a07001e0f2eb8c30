use sxd_document::dom::{Document, Element};
use sxd_document::parser;
use sxd_document::Package;

use crate::Error;

#[cfg(test)]
#[path = "description_tests.rs"]
mod description_tests;

/// Parses a robot description document into an element tree.
///
/// The returned [Package] owns the tree; elements borrowed from it stay
/// valid for as long as the package lives.
///
/// ## Parameters
///
/// * 'xml' - The description text.
///
/// ## Errors
///
/// * [Error::DescriptionParse] - Returned when the text is not well-formed
///   XML.
///
/// ## Examples
///
/// ```
/// use mechanism_control::description;
///
/// let package = description::parse("<robot><joint name='j1'/></robot>").unwrap();
/// let document = package.as_document();
/// let root = description::root_element(&document).unwrap();
/// assert_eq!(description::child_elements(root, "joint").len(), 1);
/// ```
pub fn parse(xml: &str) -> Result<Package, Error> {
    parser::parse(xml).map_err(|err| Error::DescriptionParse {
        details: err.to_string(),
    })
}

/// Returns the document's root element.
///
/// ## Errors
///
/// * [Error::DescriptionParse] - Returned when the document holds no
///   element at all.
pub fn root_element<'d>(document: &Document<'d>) -> Result<Element<'d>, Error> {
    document
        .root()
        .children()
        .into_iter()
        .find_map(|child| child.element())
        .ok_or_else(|| Error::DescriptionParse {
            details: "the document has no root element".to_string(),
        })
}

/// Returns the first child element with the given name.
pub fn child_element<'d>(parent: Element<'d>, name: &str) -> Option<Element<'d>> {
    parent
        .children()
        .into_iter()
        .filter_map(|child| child.element())
        .find(|element| element.name().local_part() == name)
}

/// Returns every child element with the given name, in document order.
pub fn child_elements<'d>(parent: Element<'d>, name: &str) -> Vec<Element<'d>> {
    parent
        .children()
        .into_iter()
        .filter_map(|child| child.element())
        .filter(|element| element.name().local_part() == name)
        .collect()
}

/// Returns the concatenated, trimmed text content of an element.
pub fn element_text(element: Element<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let Some(piece) = child.text() {
            text.push_str(piece.text());
        }
    }
    text.trim().to_string()
}

/// Returns the value of a required attribute.
///
/// ## Parameters
///
/// * 'element' - The element carrying the attribute.
/// * 'name' - The attribute name.
///
/// ## Errors
///
/// * [Error::MissingAttribute] - Returned when the attribute is absent.
pub fn required_attribute<'d>(element: Element<'d>, name: &str) -> Result<&'d str, Error> {
    element
        .attribute(name)
        .map(|attribute| attribute.value())
        .ok_or_else(|| Error::MissingAttribute {
            element: element.name().local_part().to_string(),
            attribute: name.to_string(),
        })
}

/// Returns the value of an attribute, if present.
pub fn optional_attribute<'d>(element: Element<'d>, name: &str) -> Option<&'d str> {
    element.attribute(name).map(|attribute| attribute.value())
}

/// Reads a required attribute as a floating point number.
///
/// ## Errors
///
/// * [Error::MissingAttribute] - Returned when the attribute is absent.
/// * [Error::InvalidScalar] - Returned when the value does not parse as a
///   number.
pub fn attribute_scalar(element: Element<'_>, name: &str) -> Result<f64, Error> {
    let value = required_attribute(element, name)?;
    parse_scalar(
        &format!("{}@{}", element.name().local_part(), name),
        value,
    )
}

/// Reads an attribute as a floating point number, if present.
///
/// ## Errors
///
/// * [Error::InvalidScalar] - Returned when the attribute exists but does
///   not parse as a number.
pub fn optional_attribute_scalar(element: Element<'_>, name: &str) -> Result<Option<f64>, Error> {
    match optional_attribute(element, name) {
        Some(value) => parse_scalar(
            &format!("{}@{}", element.name().local_part(), name),
            value,
        )
        .map(Some),
        None => Ok(None),
    }
}

/// Reads the text of a required child element as a floating point number.
///
/// ## Parameters
///
/// * 'parent' - The element whose child carries the value.
/// * 'name' - The child element name.
///
/// ## Errors
///
/// * [Error::MissingChild] - Returned when no child with the given name
///   exists.
/// * [Error::InvalidScalar] - Returned when the text does not parse as a
///   number.
pub fn required_child_scalar(parent: Element<'_>, name: &str) -> Result<f64, Error> {
    let child = child_element(parent, name).ok_or_else(|| Error::MissingChild {
        element: parent.name().local_part().to_string(),
        child: name.to_string(),
    })?;
    parse_scalar(name, &element_text(child))
}

/// Reads the text of a child element as a floating point number, if the
/// child is present.
///
/// ## Errors
///
/// * [Error::InvalidScalar] - Returned when the child exists but its text
///   does not parse as a number.
pub fn optional_child_scalar(parent: Element<'_>, name: &str) -> Result<Option<f64>, Error> {
    match child_element(parent, name) {
        Some(child) => parse_scalar(name, &element_text(child)).map(Some),
        None => Ok(None),
    }
}

fn parse_scalar(label: &str, value: &str) -> Result<f64, Error> {
    value.trim().parse().map_err(|_| Error::InvalidScalar {
        element: label.to_string(),
        value: value.to_string(),
    })
}
