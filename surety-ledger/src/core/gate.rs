use std::collections::HashSet;

use surety_common::{
    error::{Result, SuretyError},
    Identity,
};

/// Administrator-controlled switch plus the set of identities allowed to
/// trigger system operations such as crediting insurees.
#[derive(Debug, Clone)]
pub struct OperationalGate {
    operational: bool,
    admin: Identity,
    authorized: HashSet<Identity>,
}

impl OperationalGate {
    pub fn new(admin: Identity) -> Self {
        Self {
            operational: true,
            admin,
            authorized: HashSet::new(),
        }
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn require_operational(&self) -> Result<()> {
        if !self.operational {
            return Err(SuretyError::OperationsSuspended);
        }
        Ok(())
    }

    /// Returns whether the flag actually changed.
    pub fn set_operational(&mut self, caller: &Identity, operational: bool) -> Result<bool> {
        self.require_admin(caller)?;
        let changed = self.operational != operational;
        self.operational = operational;
        Ok(changed)
    }

    pub fn authorize(&mut self, caller: &Identity, target: &Identity) -> Result<bool> {
        self.require_admin(caller)?;
        Ok(self.authorized.insert(target.clone()))
    }

    pub fn deauthorize(&mut self, caller: &Identity, target: &Identity) -> Result<bool> {
        self.require_admin(caller)?;
        Ok(self.authorized.remove(target))
    }

    pub fn is_admin(&self, caller: &Identity) -> bool {
        *caller == self.admin
    }

    /// The administrator is always authorized.
    pub fn is_authorized(&self, caller: &Identity) -> bool {
        self.is_admin(caller) || self.authorized.contains(caller)
    }

    pub fn require_admin(&self, caller: &Identity) -> Result<()> {
        if !self.is_admin(caller) {
            return Err(SuretyError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    pub fn require_authorized(&self, caller: &Identity) -> Result<()> {
        if !self.is_authorized(caller) {
            return Err(SuretyError::Unauthorized(caller.clone()));
        }
        Ok(())
    }
}
