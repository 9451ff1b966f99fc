use crate::LogicContext;
use hashbrown::HashMap;
use smrando_game::{Capacity, Helper, Item, LogicFlag, Requirement};

fn item(item: Item) -> Requirement {
    Requirement::Item(item)
}

fn helper(helper: Helper) -> Requirement {
    Requirement::Helper(helper)
}

/// Requirement tree behind each named helper. Helpers may refer to other helpers but never to
/// themselves.
pub fn helper_requirement(h: Helper) -> Requirement {
    match h {
        Helper::CanUsePowerBombs => Requirement::make_and(vec![item(Item::Morph), item(Item::PowerBomb)]),
        Helper::CanPassBombPassages => Requirement::make_and(vec![
            item(Item::Morph),
            Requirement::make_or(vec![item(Item::Bombs), item(Item::PowerBomb)]),
        ]),
        Helper::CanDestroyBombWalls => Requirement::make_or(vec![
            helper(Helper::CanPassBombPassages),
            item(Item::ScrewAttack),
        ]),
        Helper::CanOpenRedDoors => Requirement::make_or(vec![item(Item::Missile), item(Item::Super)]),
        Helper::CanIbj => Requirement::make_and(vec![item(Item::Morph), item(Item::Bombs)]),
        Helper::CanFly => Requirement::make_or(vec![item(Item::SpaceJump), helper(Helper::CanIbj)]),
        Helper::CanParlorSpeedBoost => item(Item::SpeedBooster),
        Helper::CanSafelyUseScrewAttack => Requirement::make_and(vec![
            item(Item::ScrewAttack),
            Requirement::make_or(vec![item(Item::Varia), item(Item::Gravity)]),
        ]),
        Helper::CanEnterAndLeaveGauntlet => Requirement::make_and(vec![
            item(Item::Morph),
            Requirement::make_or(vec![helper(Helper::CanFly), item(Item::SpeedBooster)]),
            Requirement::make_or(vec![
                helper(Helper::CanIbj),
                Requirement::make_and(vec![
                    helper(Helper::CanUsePowerBombs),
                    Requirement::ItemCount(Item::PowerBomb, 2),
                ]),
                item(Item::ScrewAttack),
            ]),
        ]),
        Helper::CanWallJumpHard => Requirement::Logic(LogicFlag::HardWallJumps),
        Helper::CanLiftLight => Requirement::ItemCount(Item::ProgressiveGlove, 1),
        Helper::CanLiftHeavy => Requirement::ItemCount(Item::ProgressiveGlove, 2),
        Helper::CanPassSwordOnlyDarkRooms => Requirement::make_or(vec![
            item(Item::Lamp),
            Requirement::make_and(vec![
                Requirement::Logic(LogicFlag::Tournament),
                Requirement::ItemCount(Item::ProgressiveSword, 1),
            ]),
        ]),
        Helper::CanBlockLasers => Requirement::ItemCount(Item::ProgressiveShield, 3),
    }
}

fn raise(demand: &mut HashMap<Item, Capacity>, item: Item, count: Capacity) {
    let entry = demand.entry(item).or_insert(0);
    if *entry < count {
        *entry = count;
    }
}

fn collect_demand(req: &Requirement, ctx: &LogicContext, demand: &mut HashMap<Item, Capacity>) {
    match req {
        Requirement::Item(x) => raise(demand, *x, 1),
        Requirement::ItemCount(x, count) => raise(demand, *x, *count),
        Requirement::EnergyReserves(count) => {
            raise(demand, Item::ETank, *count);
            raise(demand, Item::ReserveTank, *count);
        }
        Requirement::Helper(h) => collect_demand(ctx.helper(*h), ctx, demand),
        Requirement::Medallion(dungeon) => {
            if let Some(&medallion) = ctx.medallions.get(dungeon) {
                raise(demand, medallion, 1);
            }
        }
        Requirement::And(reqs) => {
            // A branch gated by a disabled logic flag can never contribute.
            let disabled = reqs
                .iter()
                .any(|r| matches!(r, Requirement::Logic(flag) if !ctx.flag(*flag)));
            if !disabled {
                for r in reqs {
                    collect_demand(r, ctx, demand);
                }
            }
        }
        Requirement::Or(reqs) => {
            for r in reqs {
                collect_demand(r, ctx, demand);
            }
        }
        Requirement::Free
        | Requirement::Never
        | Requirement::Logic(_)
        | Requirement::Rewards(_)
        | Requirement::RequiredBosses => {}
    }
}

/// For each item some requirement refers to, the largest count any of them asks for.
/// Copies beyond that count can never change what is reachable.
pub fn item_demand<'a>(
    reqs: impl IntoIterator<Item = &'a Requirement>,
    ctx: &LogicContext,
) -> HashMap<Item, Capacity> {
    let mut demand: HashMap<Item, Capacity> = HashMap::new();
    for req in reqs {
        collect_demand(req, ctx, &mut demand);
    }
    demand
}
