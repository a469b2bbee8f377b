use vanguard_core::{AbilityId, UnitKind, UpgradeId};

use crate::steps::{
    AddOnStep, AnnounceStep, ConstructionStep, DefenseWaveStep, FirstWaveStep,
    FullSupplyWaveStep, MarineStep, OrbitalStep, PlanetaryStep, RefineryStep, SupplyDepotStep,
    TownHallStep, TurretStep, UpgradeStep,
};
use crate::BuildStep;

/// Named, ordered list of build steps.
#[derive(Debug)]
pub struct Strategy {
    name: String,
    steps: Vec<Box<dyn BuildStep>>,
}

impl Strategy {
    /// Creates a strategy from steps listed in priority order.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Box<dyn BuildStep>>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Name of the strategy.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the steps in priority order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name())
    }

    pub(crate) fn steps_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn BuildStep>> {
        self.steps.iter_mut()
    }

    /// Marine-heavy opening with two early bases, a timing attack once
    /// infantry weapons start, then continuous expansion and upgrades.
    #[must_use]
    pub fn standard() -> Self {
        let version = format!("Vanguard {}", env!("CARGO_PKG_VERSION"));
        let steps: Vec<Box<dyn BuildStep>> = vec![
            Box::new(DefenseWaveStep::new()),
            Box::new(SupplyDepotStep::new()),
            Box::new(AnnounceStep::new(version)),
            Box::new(ConstructionStep::new(
                "Barracks",
                UnitKind::Barracks,
                AbilityId::BuildBarracks,
                1,
                &[UnitKind::SupplyDepot],
            )),
            Box::new(RefineryStep::new(1)),
            Box::new(OrbitalStep::new(1)),
            Box::new(AddOnStep::new(
                "Barracks Reactor",
                UnitKind::Barracks,
                UnitKind::BarracksReactor,
                AbilityId::BuildReactorBarracks,
                1,
            )),
            Box::new(TownHallStep::new(2)),
            Box::new(MarineStep::new()),
            Box::new(FullSupplyWaveStep::new()),
            Box::new(ConstructionStep::new(
                "Barracks",
                UnitKind::Barracks,
                AbilityId::BuildBarracks,
                3,
                &[UnitKind::SupplyDepot],
            )),
            Box::new(OrbitalStep::new(2)),
            Box::new(AddOnStep::new(
                "Barracks Tech Lab",
                UnitKind::Barracks,
                UnitKind::BarracksTechLab,
                AbilityId::BuildTechLabBarracks,
                2,
            )),
            Box::new(UpgradeStep::new(
                "Combat Shield",
                UpgradeId::CombatShield,
                UnitKind::BarracksTechLab,
            )),
            Box::new(UpgradeStep::new(
                "Stimpack",
                UpgradeId::Stimpack,
                UnitKind::BarracksTechLab,
            )),
            Box::new(ConstructionStep::new(
                "Factory",
                UnitKind::Factory,
                AbilityId::BuildFactory,
                1,
                &[UnitKind::BarracksTechLab],
            )),
            Box::new(ConstructionStep::new(
                "Engineering Bay",
                UnitKind::EngineeringBay,
                AbilityId::BuildEngineeringBay,
                1,
                &[UnitKind::SupplyDepot],
            )),
            Box::new(TurretStep::new()),
            Box::new(UpgradeStep::new(
                "Infantry Weapons Level 1",
                UpgradeId::InfantryWeapons1,
                UnitKind::EngineeringBay,
            )),
            Box::new(FirstWaveStep::new()),
            Box::new(RefineryStep::new(4)),
            Box::new(ConstructionStep::new(
                "Barracks",
                UnitKind::Barracks,
                AbilityId::BuildBarracks,
                5,
                &[UnitKind::SupplyDepot],
            )),
            Box::new(ConstructionStep::new(
                "Starport",
                UnitKind::Starport,
                AbilityId::BuildStarport,
                1,
                &[UnitKind::Factory],
            )),
            Box::new(AddOnStep::new(
                "Factory Tech Lab",
                UnitKind::Factory,
                UnitKind::FactoryTechLab,
                AbilityId::BuildTechLabFactory,
                1,
            )),
            Box::new(AddOnStep::new(
                "Barracks Reactor",
                UnitKind::Barracks,
                UnitKind::BarracksReactor,
                AbilityId::BuildReactorBarracks,
                3,
            )),
            Box::new(AddOnStep::new(
                "Starport Reactor",
                UnitKind::Starport,
                UnitKind::StarportReactor,
                AbilityId::BuildReactorStarport,
                1,
            )),
            Box::new(UpgradeStep::new(
                "Infantry Armor Level 1",
                UpgradeId::InfantryArmor1,
                UnitKind::EngineeringBay,
            )),
            // A second timing once the reactors are up.
            Box::new(FirstWaveStep::new()),
            Box::new(RefineryStep::new(0)),
            Box::new(PlanetaryStep::new()),
            Box::new(ConstructionStep::new(
                "Armory",
                UnitKind::Armory,
                AbilityId::BuildArmory,
                1,
                &[UnitKind::Factory],
            )),
            Box::new(UpgradeStep::new(
                "Infantry Weapons Level 2",
                UpgradeId::InfantryWeapons2,
                UnitKind::EngineeringBay,
            )),
            Box::new(UpgradeStep::new(
                "Infantry Armor Level 2",
                UpgradeId::InfantryArmor2,
                UnitKind::EngineeringBay,
            )),
            Box::new(UpgradeStep::new(
                "Infantry Weapons Level 3",
                UpgradeId::InfantryWeapons3,
                UnitKind::EngineeringBay,
            )),
            Box::new(UpgradeStep::new(
                "Infantry Armor Level 3",
                UpgradeId::InfantryArmor3,
                UnitKind::EngineeringBay,
            )),
        ];

        Self::new("Standard", steps)
    }
}
