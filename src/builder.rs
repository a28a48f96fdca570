use anyhow::Result;
use tracing::{debug, info};

use crate::errors::BuildError;
use crate::graph::DependencyGraph;
use crate::loaders::{
    LaunchTemplatesLoader, ResourceMapper, SecurityGroupsLoader, VariablesLoader,
};
use crate::mapping::Mapping;
use crate::model::ThreatModel;
use crate::plan::Plan;
use crate::transformations::{
    AttackSurfaceCalculator, ChildrenCalculator, DataflowCreator, ParentCalculator,
    SingletonTransformer, Transformation,
};

/// Orchestrates one conversion: creates the empty model, runs the loaders and
/// the enrichment passes in their fixed order, and wraps whatever fails into
/// a single [`BuildError`].
///
/// The model is exclusively owned by one invocation; the plan, graph and
/// mapping stay read-only and may be shared across concurrent builders.
pub struct ModelBuilder<'a> {
    project_id: &'a str,
    project_name: &'a str,
    plan: &'a Plan,
    graph: &'a DependencyGraph,
    mapping: &'a Mapping,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        project_id: &'a str,
        project_name: &'a str,
        plan: &'a Plan,
        graph: &'a DependencyGraph,
        mapping: &'a Mapping,
    ) -> Self {
        Self {
            project_id,
            project_name,
            plan,
            graph,
            mapping,
        }
    }

    pub fn build(&self) -> Result<ThreatModel, BuildError> {
        info!(
            "building threat model for project {} ({} resources)",
            self.project_id,
            self.plan.resources.len()
        );
        let mut model = ThreatModel::new(self.project_id, self.project_name);

        self.stage("resource mapping", &mut model, |m| {
            ResourceMapper::new(&self.plan.resources, self.mapping).load(m)
        })?;
        self.stage("security groups", &mut model, |m| {
            SecurityGroupsLoader::new(&self.plan.resources).load(m)
        })?;
        self.stage("launch templates", &mut model, |m| {
            LaunchTemplatesLoader::new(&self.plan.resources).load(m)
        })?;
        self.stage("variables", &mut model, |m| {
            VariablesLoader::new(&self.plan.variables).load(m)
        })?;

        let passes: Vec<Box<dyn Transformation + '_>> = vec![
            Box::new(ParentCalculator::new(self.graph)),
            Box::new(ChildrenCalculator::new(self.graph)),
            Box::new(DataflowCreator::new(self.graph)),
            Box::new(AttackSurfaceCalculator::new(
                self.graph,
                self.mapping,
                &self.plan.resources,
            )),
            Box::new(SingletonTransformer::new()),
        ];
        for pass in passes {
            debug!("running pass {}", pass.name());
            pass.transform(&mut model)
                .map_err(|source| BuildError::in_stage(pass.name(), source))?;
        }

        info!(
            "built model with {} components and {} dataflows",
            model.components.len(),
            model.dataflows.len()
        );
        Ok(model)
    }

    fn stage<F>(&self, name: &'static str, model: &mut ThreatModel, run: F) -> Result<(), BuildError>
    where
        F: FnOnce(&mut ThreatModel) -> Result<()>,
    {
        debug!("running stage {name}");
        run(model).map_err(|source| BuildError::in_stage(name, source))
    }
}
