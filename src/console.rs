use std::io::{self, BufRead, Write};

use waygate_edit::EditStore;
use waygate_geom::Vec3;
use waygate_io::RecordStore;
use waygate_portals::{Portal, PortalId, Portals, ProximityOrdering, SharedPortals};
use waygate_world::WorldList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
commands:
  list [world x z]       portals, nearest first when a position is given
  target <src> <dst>     select the target of <src>
  lock <id> | unlock <id>
  activate <id> | deactivate <id>
  status <id>
  sync                   re-render every portal
  save | reload          write or re-read the portal data file
  quit";

/// Line-oriented operator console. Every command takes the registry lock for
/// its whole duration.
pub struct Console {
    portals: SharedPortals<EditStore>,
    worlds: WorldList,
    backend: Box<dyn RecordStore + Send>,
}

impl Console {
    pub fn new(
        portals: SharedPortals<EditStore>,
        worlds: WorldList,
        backend: Box<dyn RecordStore + Send>,
    ) -> Self {
        Self {
            portals,
            worlds,
            backend,
        }
    }

    pub fn run(&mut self, input: impl BufRead, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "type 'help' for commands")?;
        for line in input.lines() {
            if self.execute(&line?, out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> io::Result<Flow> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, rest)) = args.split_first() else {
            return Ok(Flow::Continue);
        };
        let mut reg = self.portals.lock().unwrap();
        match (cmd, rest) {
            ("help", _) => writeln!(out, "{}", HELP)?,
            ("quit" | "exit", _) => return Ok(Flow::Quit),
            ("list", []) => {
                let all: Vec<&Portal> = reg.iter().collect();
                write_list(&reg, &all, out)?;
            }
            ("list", [world, x, z]) => match (x.parse::<f64>(), z.parse::<f64>()) {
                (Ok(x), Ok(z)) => {
                    let ord = ProximityOrdering::new(*world, Vec3::new(x, 0.0, z));
                    let mut all: Vec<&Portal> = reg.iter().collect();
                    ord.sort(&mut all);
                    write_list(&reg, &all, out)?;
                }
                _ => writeln!(out, "bad coordinates")?,
            },
            ("target", [src, dst]) => match (resolve(&reg, src), resolve(&reg, dst)) {
                (Ok(src), Ok(dst)) => {
                    let ok = reg.select_target(src, dst);
                    report(out, ok, "target set", "cannot target (locked or same portal)")?;
                }
                (Err(e), _) | (_, Err(e)) => writeln!(out, "{}", e)?,
            },
            ("lock" | "unlock", [id]) => match resolve(&reg, id) {
                Ok(id) => {
                    reg.set_target_locked(id, cmd == "lock");
                    writeln!(out, "{}ed", cmd)?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("activate", [id]) => match resolve(&reg, id) {
                Ok(id) => {
                    let ok = reg.activate(id, None);
                    report(out, ok, "activated", "no usable target")?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("deactivate", [id]) => match resolve(&reg, id) {
                Ok(id) => {
                    reg.deactivate(id, None);
                    writeln!(out, "deactivated")?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("status", [id]) => match resolve(&reg, id) {
                Ok(id) => write_status(&mut reg, id, &self.worlds, out)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            ("sync", []) => {
                reg.sync_all();
                let stats = reg.store().stats();
                writeln!(
                    out,
                    "synced {} portal(s); {} block(s) tracked",
                    reg.len(),
                    stats.block_edits
                )?;
            }
            ("save", []) => match reg.save_to(self.backend.as_mut()) {
                Ok(n) => writeln!(out, "saved {} portal(s)", n)?,
                Err(e) => writeln!(out, "save failed: {}", e)?,
            },
            ("reload", []) => match reg.load_from(self.backend.as_ref()) {
                Ok(r) => writeln!(out, "loaded {} portal(s), skipped {}", r.loaded, r.skipped)?,
                Err(e) => writeln!(out, "reload failed: {}", e)?,
            },
            _ => writeln!(out, "unknown command or arguments: {}", line.trim())?,
        }
        Ok(Flow::Continue)
    }
}

/// Find the portal whose id starts with `prefix`; the match must be unique.
pub fn resolve(reg: &Portals<EditStore>, prefix: &str) -> Result<PortalId, String> {
    let prefix = prefix.to_ascii_lowercase();
    let mut hits = reg
        .iter()
        .map(Portal::id)
        .filter(|id| id.to_string().starts_with(&prefix));
    match (hits.next(), hits.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(format!("no portal matches '{}'", prefix)),
        (Some(_), Some(_)) => Err(format!("'{}' is ambiguous", prefix)),
    }
}

fn report(out: &mut dyn Write, ok: bool, yes: &str, no: &str) -> io::Result<()> {
    writeln!(out, "{}", if ok { yes } else { no })
}

fn write_list(reg: &Portals<EditStore>, portals: &[&Portal], out: &mut dyn Write) -> io::Result<()> {
    if portals.is_empty() {
        return writeln!(out, "no portals");
    }
    for p in portals {
        let short = p.id().to_string();
        let pos = p.spawn_ref().pos();
        writeln!(
            out,
            "{} {:<20} {} ({:.1}, {:.1}, {:.1}){}",
            &short[..8],
            p.name(),
            p.spawn_ref().world_name(),
            pos.x,
            pos.y,
            pos.z,
            if reg.is_activated(p.id()) { " *" } else { "" }
        )?;
    }
    Ok(())
}

fn write_status(
    reg: &mut Portals<EditStore>,
    id: PortalId,
    worlds: &WorldList,
    out: &mut dyn Write,
) -> io::Result<()> {
    let spawn = match reg.spawn(id, worlds) {
        Some(loc) => format!("{} {:?}", loc.world_name(), loc.pos),
        None => "world not loaded".to_string(),
    };
    let Some(p) = reg.portal_for(id) else {
        return Ok(());
    };
    let target = match p.target(reg) {
        Some(t) => format!("{} ({})", t.name(), t.id()),
        None => "none".to_string(),
    };
    let style = match p.style_key() {
        Some(key) => key.to_string(),
        None => "custom".to_string(),
    };
    writeln!(out, "{}", p)?;
    writeln!(out, "  owner:      {}", p.owner())?;
    writeln!(out, "  spawn:      {}", spawn)?;
    writeln!(out, "  visibility: {:?}", p.visibility())?;
    writeln!(out, "  style:      {}", style)?;
    writeln!(out, "  blocks:     {}", p.blocks().len())?;
    writeln!(
        out,
        "  target:     {}{}",
        target,
        if p.target_locked() { " [locked]" } else { "" }
    )?;
    writeln!(out, "  activated:  {}", reg.is_activated(id))?;
    Ok(())
}
