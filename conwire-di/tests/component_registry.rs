mod component_registry_test {
    use conwire_di::component::{ComponentDeclaration, TypeDescriptor};
    use conwire_di::component_registry::conditional::on_component::{
        evaluate, OnMissingComponent, RegistrationCondition, SearchStrategy, MAX_HIERARCHY_DEPTH,
    };
    use conwire_di::component_registry::conditional::{
        ComponentDefinitionRegistryFacadePtr, ConditionMetadata,
    };
    use conwire_di::component_registry::internal::{submit, ConfigurationRegisterer};
    use conwire_di::component_registry::{
        ComponentConfiguration, ComponentDefinitionRegistry, ComponentDefinitionRegistryBuilder,
        ComponentRegistration, DefaultComponentDefinitionRegistry, SharedPtr,
    };

    fn service() -> TypeDescriptor {
        TypeDescriptor::new("Service")
    }

    fn user_configuration() -> ComponentConfiguration {
        ComponentConfiguration::new(ComponentDeclaration::new(
            "staticUserConfiguration",
            TypeDescriptor::new("StaticUserConfiguration"),
        ))
        .with_priority(10)
        .with_unconditional_component(ComponentDeclaration::new("userService", service()))
    }

    fn default_configuration() -> ComponentConfiguration {
        ComponentConfiguration::new(ComponentDeclaration::new(
            "staticDefaultConfiguration",
            TypeDescriptor::new("StaticDefaultConfiguration"),
        ))
        .with_priority(-128)
        .with_component(
            ComponentRegistration::new(ComponentDeclaration::new("defaultService", service()))
                .with_condition(OnMissingComponent(RegistrationCondition::new()).into_condition()),
        )
    }

    submit! {
        ConfigurationRegisterer {
            register: default_configuration,
        }
    }

    submit! {
        ConfigurationRegisterer {
            register: user_configuration,
        }
    }

    fn build_parent() -> ComponentDefinitionRegistryFacadePtr {
        let mut parent = DefaultComponentDefinitionRegistry::new(false, None);
        parent
            .register_component(ComponentDeclaration::new("parentService", service()))
            .unwrap();

        SharedPtr::new(parent) as ComponentDefinitionRegistryFacadePtr
    }

    #[test]
    fn should_order_static_configurations_by_priority() {
        let registry = ComponentDefinitionRegistryBuilder::new()
            .with_static_configurations()
            .build()
            .unwrap();

        assert!(registry.is_name_registered("userService"));
        assert!(!registry.is_name_registered("defaultService"));
        assert!(registry
            .condition_evaluation_report()
            .outcomes_for("defaultService")
            .is_some());
        assert!(!registry
            .condition_evaluation_report()
            .is_fully_matched("defaultService"));
    }

    #[test]
    fn should_evaluate_against_hierarchy() {
        let registry = DefaultComponentDefinitionRegistry::new(false, Some(build_parent()));
        let declaration = ComponentDeclaration::new("candidate", service());

        let outcome = evaluate(
            ConditionMetadata::Component(&declaration),
            &RegistrationCondition::new(),
            &registry,
        );
        assert!(outcome.matched);
        assert_eq!(outcome.matched_names, vec!["parentService".to_string()]);
        assert_eq!(
            outcome.reason,
            "(types: Service; search: all) found components of type 'Service' parentService"
        );

        let outcome = evaluate(
            ConditionMetadata::Component(&declaration),
            &RegistrationCondition::new().with_search_strategy(SearchStrategy::Current),
            &registry,
        );
        assert!(!outcome.matched);
        assert_eq!(
            outcome.reason,
            "(types: Service; search: current) did not find any components"
        );
    }

    #[test]
    fn should_find_nothing_in_missing_ancestors() {
        let mut registry = DefaultComponentDefinitionRegistry::new(false, None);
        registry
            .register_component(ComponentDeclaration::new("localService", service()))
            .unwrap();

        let outcome = evaluate(
            ConditionMetadata::Component(&ComponentDeclaration::new("candidate", service())),
            &RegistrationCondition::new()
                .with_name("localService")
                .with_search_strategy(SearchStrategy::Ancestors),
            &registry,
        );
        assert!(!outcome.matched);
        assert!(outcome.matched_names.is_empty());
    }

    #[test]
    fn should_register_child_components_depending_on_parent() {
        let child_configuration = ComponentConfiguration::new(ComponentDeclaration::new(
            "childConfiguration",
            TypeDescriptor::new("ChildConfiguration"),
        ))
        .with_component(
            ComponentRegistration::new(ComponentDeclaration::new("childService", service()))
                .with_condition(OnMissingComponent(RegistrationCondition::new()).into_condition()),
        )
        .with_component(
            ComponentRegistration::new(ComponentDeclaration::new("localOnlyService", service()))
                .with_condition(
                    OnMissingComponent(
                        RegistrationCondition::new()
                            .with_name("parentService")
                            .with_search_strategy(SearchStrategy::Current),
                    )
                    .into_condition(),
                ),
        );

        let registry = ComponentDefinitionRegistryBuilder::new()
            .with_parent(build_parent())
            .with_configuration(child_configuration)
            .build()
            .unwrap();

        assert!(!registry.is_name_registered("childService"));
        assert!(registry.is_name_registered("localOnlyService"));
        assert!(!registry.is_name_registered("parentService"));
        assert_eq!(registry.components_by_type(&service()).len(), 1);

        let report = registry.condition_evaluation_report().to_string();
        assert!(report.contains("childService"));
        assert!(report.contains("OnMissingComponent"));
    }

    fn registry_with_ancestor_at(distance: usize) -> DefaultComponentDefinitionRegistry {
        let mut deepest = DefaultComponentDefinitionRegistry::new(false, None);
        deepest
            .register_component(ComponentDeclaration::new("deepService", service()))
            .unwrap();

        let mut parent = SharedPtr::new(deepest) as ComponentDefinitionRegistryFacadePtr;
        for _ in 1..distance {
            parent = SharedPtr::new(DefaultComponentDefinitionRegistry::new(false, Some(parent)))
                as ComponentDefinitionRegistryFacadePtr;
        }

        DefaultComponentDefinitionRegistry::new(false, Some(parent))
    }

    fn find_deep_service(registry: &DefaultComponentDefinitionRegistry) -> bool {
        evaluate(
            ConditionMetadata::Component(&ComponentDeclaration::new("candidate", service())),
            &RegistrationCondition::new().with_name("deepService"),
            registry,
        )
        .matched
    }

    #[test]
    fn should_search_ancestors_up_to_depth_limit() {
        assert!(find_deep_service(&registry_with_ancestor_at(MAX_HIERARCHY_DEPTH)));
    }

    #[test]
    fn should_ignore_ancestors_beyond_depth_limit() {
        assert!(!find_deep_service(&registry_with_ancestor_at(MAX_HIERARCHY_DEPTH + 1)));
    }

    #[test]
    fn should_only_match_factories_with_prefixed_names() {
        let mut registry = DefaultComponentDefinitionRegistry::new(false, None);
        registry
            .register_component(ComponentDeclaration::new("foo", service()))
            .unwrap();
        registry
            .register_component(ComponentDeclaration::new(
                "serviceFactory",
                TypeDescriptor::new("ServiceFactory").into_factory(Some(service())),
            ))
            .unwrap();

        let declaration = ComponentDeclaration::new("candidate", service());
        let find_named = |name: &str| {
            evaluate(
                ConditionMetadata::Component(&declaration),
                &RegistrationCondition::new()
                    .with_name(name)
                    .with_search_strategy(SearchStrategy::Current),
                &registry,
            )
        };

        let outcome = find_named("&foo");
        assert!(!outcome.matched);
        assert_eq!(
            outcome.reason,
            "(names: &foo; search: current) did not find any components"
        );

        assert!(find_named("foo").matched);
        assert_eq!(
            find_named("&serviceFactory").matched_names,
            vec!["&serviceFactory".to_string()]
        );
        assert!(find_named("serviceFactory").matched);
    }
}
