use super::*;

#[test]
fn test_parse_well_formed_document() {
    let package = parse("<robot><joint name='j1'/><joint name='j2'/></robot>").unwrap();
    let document = package.as_document();

    let root = root_element(&document).unwrap();
    assert_eq!(root.name().local_part(), "robot");
    assert_eq!(child_elements(root, "joint").len(), 2);
}

#[test]
fn when_the_document_is_malformed_it_should_report_a_parse_error() {
    let result = parse("<robot><joint images</robot>");

    assert!(matches!(result, Err(Error::DescriptionParse { .. })));
}

#[test]
fn test_child_element() {
    let package = parse("<robot><actuator name='a1'/><joint name='j1'/></robot>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    let joint = child_element(root, "joint").unwrap();
    assert_eq!(joint.name().local_part(), "joint");
    assert!(child_element(root, "transmission").is_none());
}

#[test]
fn test_element_text() {
    let package = parse("<robot><limitMin> -1.25 </limitMin></robot>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();
    let child = child_element(root, "limitMin").unwrap();

    assert_eq!(element_text(child), "-1.25");
}

#[test]
fn test_required_attribute() {
    let package = parse("<joint name='j1'/>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    assert_eq!(required_attribute(root, "name").unwrap(), "j1");
    assert_eq!(
        required_attribute(root, "type"),
        Err(Error::MissingAttribute {
            element: "joint".to_string(),
            attribute: "type".to_string(),
        })
    );
}

#[test]
fn test_attribute_scalar() {
    let package = parse("<flexJoint name='j1' mechanicalReduction='2.5'/>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    assert_eq!(attribute_scalar(root, "mechanicalReduction").unwrap(), 2.5);
    assert_eq!(
        attribute_scalar(root, "name"),
        Err(Error::InvalidScalar {
            element: "flexJoint@name".to_string(),
            value: "j1".to_string(),
        })
    );
}

#[test]
fn test_optional_attribute_scalar() {
    let package = parse("<joint reduction='4'/>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    assert_eq!(
        optional_attribute_scalar(root, "reduction").unwrap(),
        Some(4.0)
    );
    assert_eq!(optional_attribute_scalar(root, "offset").unwrap(), None);
}

#[test]
fn test_required_child_scalar() {
    let package = parse("<joint><limitMin>-1.0</limitMin></joint>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    assert_eq!(required_child_scalar(root, "limitMin").unwrap(), -1.0);
    assert_eq!(
        required_child_scalar(root, "limitMax"),
        Err(Error::MissingChild {
            element: "joint".to_string(),
            child: "limitMax".to_string(),
        })
    );
}

#[test]
fn when_a_scalar_does_not_parse_it_should_report_the_offending_text() {
    let package = parse("<joint><limitMin>wide</limitMin></joint>").unwrap();
    let document = package.as_document();
    let root = root_element(&document).unwrap();

    assert_eq!(
        required_child_scalar(root, "limitMin"),
        Err(Error::InvalidScalar {
            element: "limitMin".to_string(),
            value: "wide".to_string(),
        })
    );
    assert_eq!(
        optional_child_scalar(root, "limitMin"),
        Err(Error::InvalidScalar {
            element: "limitMin".to_string(),
            value: "wide".to_string(),
        })
    );
}
