// Copyright (c) 2017-2019 Rene van der Meer
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! User and group lookups used to explain permission errors.

use std::ffi::CString;
use std::mem;
use std::ptr;

/// Group that udev commonly grants access to the PWM class.
pub const PWM_GROUP: &str = "gpio";

#[derive(Debug, Copy, Clone)]
enum Database {
    Passwd,
    Group,
}

// Find the numeric user or group ID for the specified name
fn lookup_id(database: Database, name: &str) -> Option<u32> {
    let name_cstr = CString::new(name).ok()?;
    let mut buf: [libc::c_char; 4096] = [0; 4096];

    unsafe {
        match database {
            Database::Passwd => {
                let mut pwd: libc::passwd = mem::zeroed();
                let mut res: *mut libc::passwd = ptr::null_mut();
                let found = libc::getpwnam_r(
                    name_cstr.as_ptr(),
                    &mut pwd,
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut res,
                ) == 0
                    && !res.is_null();

                found.then(|| (*res).pw_uid)
            }
            Database::Group => {
                let mut grp: libc::group = mem::zeroed();
                let mut res: *mut libc::group = ptr::null_mut();
                let found = libc::getgrnam_r(
                    name_cstr.as_ptr(),
                    &mut grp,
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut res,
                ) == 0
                    && !res.is_null();

                found.then(|| (*res).gr_gid)
            }
        }
    }
}

// Check whether the process is a member of `gid`, either as its effective
// group or as one of its supplementary groups.
fn in_group(gid: u32) -> bool {
    if unsafe { libc::getegid() } == gid {
        return true;
    }

    let mut groups: [libc::gid_t; 256] = [0; 256];
    let count = unsafe { libc::getgroups(groups.len() as libc::c_int, groups.as_mut_ptr()) };
    if count < 0 {
        return false;
    }

    groups[..count as usize].contains(&gid)
}

/// Checks whether we're running as root or effective root.
pub fn is_root() -> bool {
    let root_uid = lookup_id(Database::Passwd, "root").unwrap_or(0);

    unsafe { libc::getuid() == root_uid || libc::geteuid() == root_uid }
}

/// Suggests how to get write access to the PWM class after a permission
/// error. Returns `None` when running as root, since no hint applies.
pub fn permission_hint() -> Option<String> {
    if is_root() {
        return None;
    }

    let hint = match lookup_id(Database::Group, PWM_GROUP) {
        Some(gid) if in_group(gid) => format!(
            "the current user is a member of `{}`, make sure udev hands /sys/class/pwm over to that group, or run as root",
            PWM_GROUP
        ),
        Some(_) => format!(
            "add the current user to the `{}` group and configure udev to grant it access to /sys/class/pwm, or run as root",
            PWM_GROUP
        ),
        None => "writing to /sys/class/pwm requires root privileges".to_owned(),
    };

    Some(hint)
}
