//! Skeletons of the bundle's files.
//!
//! Dynamic values enter only as JSON literals (or escaped HTML text for the
//! page title), so the skeletons never interpolate raw configuration text.

/// Privileged automation runtime (Electron main process).
pub const MAIN_JS: &str = r#"// Generated by installer_genie.
'use strict';

const { app, BrowserWindow, ipcMain } = require('electron');
const { execFile, spawn } = require('child_process');
const crypto = require('crypto');
const fs = require('fs');
const http = require('http');
const https = require('https');
const os = require('os');
const path = require('path');

const PLAN = {{plan_json}};
const DEPARTMENTS = {{departments_json}};
const BACKUP_ROOTS = {{backup_roots_json}};
const SCRIPT_RUNNERS = {{script_runners_json}};
const SCRIPT_PATH_TOKEN = {{script_path_token_json}};
const CLIENT = {{client_json}};
const MAX_REDIRECTS = {{max_redirects}};
const RESPONSE_TIMEOUT_MS = {{response_timeout_ms}};
const CHUNK_TIMEOUT_MS = {{chunk_timeout_ms}};
const READINESS = {{readiness_json}};
const LAUNCHER_POLL = {{launcher_json}};
const CLEANUP_GRACE_MS = {{cleanup_grace_ms}};
{{#if backend_enabled}}
const STATIC_BACKUP = {{static_backup_json}};
{{/if}}

const ACQUIRED = 40;
const INSTALLED = 70;
const CONFIGURED = 90;

let mainWindow = null;
let lastProgress;
let running = false;

function send(channel, value) {
  if (mainWindow && !mainWindow.isDestroyed()) {
    mainWindow.webContents.send(channel, value);
  }
}

function log(line) {
  console.log(line);
  send('log-line', line);
}

// null means indeterminate.
function progress(value) {
  if (value === lastProgress) return;
  lastProgress = value;
  send('progress-value', value);
}

function sleep(ms) {
  return new Promise((resolve) => setTimeout(resolve, ms));
}

function removeQuietly(file) {
  try {
    fs.rmSync(file, { force: true });
  } catch (_) {
    // best effort
  }
}

function resourcePath(name) {
  const base = app.isPackaged ? path.dirname(process.execPath) : process.cwd();
  return path.join(base, 'resources', name);
}

function programRoots() {
  return [
    process.env.ProgramFiles || 'C:\\Program Files',
    process.env['ProgramFiles(x86)'] || 'C:\\Program Files (x86)',
  ];
}

function firstExisting(candidates) {
  return candidates.find((candidate) => fs.existsSync(candidate)) || null;
}

async function pollUntil(policy, probe, onHeartbeat) {
  for (let attempt = 1; attempt <= policy.maxAttempts; attempt++) {
    const found = probe();
    if (found) return found;
    if (policy.heartbeatEvery > 0 && attempt % policy.heartbeatEvery === 0) {
      onHeartbeat(attempt);
    }
    if (attempt < policy.maxAttempts) await sleep(policy.intervalMs);
  }
  return null;
}

function psQuote(value) {
  return "'" + String(value).replace(/'/g, "''") + "'";
}

function quoteArg(arg) {
  if (arg === '') return '""';
  if (!/\s/.test(arg) || arg.startsWith('"')) return arg;
  const property = /^([A-Za-z0-9_]+)=(.*)$/.exec(arg);
  return property ? property[1] + '="' + property[2] + '"' : '"' + arg + '"';
}

function run(file, args) {
  return new Promise((resolve, reject) => {
    const child = spawn(file, args, { windowsHide: true, stdio: 'ignore' });
    child.on('error', reject);
    child.on('exit', (code) => resolve(code === null ? -1 : code));
  });
}

function capture(file, args) {
  return new Promise((resolve) => {
    execFile(file, args, { windowsHide: true }, (error, stdout) => resolve(error ? '' : String(stdout)));
  });
}

function runPowershell(script) {
  return run('powershell.exe', ['-NoProfile', '-NonInteractive', '-ExecutionPolicy', 'Bypass', '-Command', script]);
}

function runElevated(file, args) {
  let script = '$p = Start-Process -FilePath ' + psQuote(file);
  if (args.length > 0) {
    script += ' -ArgumentList @(' + args.map((a) => psQuote(quoteArg(a))).join(',') + ')';
  }
  script += ' -Verb RunAs -Wait -PassThru; exit $p.ExitCode';
  return runPowershell(script);
}

function download(url, dest, onPercent, hops) {
  hops = hops || 0;
  return new Promise((resolve, reject) => {
    const fail = (error) => {
      removeQuietly(dest);
      reject(error);
    };
    const client = url.startsWith('https:') ? https : http;
    const request = client.get(url, (response) => {
      const status = response.statusCode || 0;
      if (status >= 300 && status < 400 && response.headers.location) {
        response.resume();
        if (hops >= MAX_REDIRECTS) {
          fail(new Error('more than ' + MAX_REDIRECTS + ' redirects'));
          return;
        }
        const next = new URL(response.headers.location, url);
        log('Redirected to ' + next.host);
        download(next.toString(), dest, onPercent, hops + 1).then(resolve, reject);
        return;
      }
      if (status !== 200) {
        response.resume();
        fail(new Error('server answered ' + status));
        return;
      }
      const total = parseInt(response.headers['content-length'] || '0', 10);
      let received = 0;
      const file = fs.createWriteStream(dest);
      response.setTimeout(CHUNK_TIMEOUT_MS, () => response.destroy(new Error('download stalled')));
      response.on('data', (chunk) => {
        received += chunk.length;
        onPercent(total > 0 ? Math.min(100, Math.floor((received * 100) / total)) : null);
      });
      response.on('error', (error) => {
        file.destroy();
        fail(error);
      });
      file.on('error', fail);
      file.on('finish', () => {
        if (total > 0 && received < total) {
          fail(new Error('connection closed after ' + received + ' of ' + total + ' bytes'));
        } else {
          log('Download complete (' + received + ' bytes)');
          resolve(received);
        }
      });
      response.pipe(file);
    });
    request.setTimeout(RESPONSE_TIMEOUT_MS, () => request.destroy(new Error('no response from server')));
    request.on('error', fail);
  });
}

function selectRoots(ids) {
  const chosen = [];
  for (const id of ids) {
    const root = BACKUP_ROOTS.find((candidate) => candidate.id === id);
    if (!root || chosen.includes(id)) continue;
    const conflict = chosen.indexOf(root.conflictsWith);
    if (conflict >= 0) chosen.splice(conflict, 1);
    chosen.push(id);
  }
  return chosen;
}

function checkRequest(request) {
  if (PLAN.collect_user_info) {
    if (!PLAN.projects.includes(request.project)) {
      throw new Error('unknown project ' + request.project);
    }
    if (!(DEPARTMENTS[request.project] || []).includes(request.department)) {
      throw new Error('department ' + request.department + ' is not offered for project ' + request.project);
    }
  }
  if (PLAN.backup_selection && request.backupRoots.length === 0) {
    throw new Error('select at least one backup location');
  }
}
{{#if backend_enabled}}

function buildPayload(request) {
  const connection = Object.assign({}, PLAN.backend.connection);
  if (PLAN.backend.device_naming) {
    connection.computer_name = [request.project, request.department, os.hostname()].join('-');
  }
  const payload = { connections: [connection] };
  if (PLAN.backend.backup) {
    payload.backup_path = BACKUP_ROOTS
      .filter((root) => request.backupRoots.includes(root.id))
      .map((root) => root.path);
  }
  return Object.assign(payload, STATIC_BACKUP);
}

async function forceClean() {
  log('Removing previous installation');
  const query =
    "Get-ItemProperty 'HKLM:\\Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*'," +
    "'HKLM:\\Software\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\*' " +
    '-ErrorAction SilentlyContinue | Where-Object { $_.DisplayName -like ' +
    psQuote(CLIENT.displayName + '*') +
    ' } | Select-Object -First 1 -ExpandProperty PSChildName';
  const output = await capture('powershell.exe', ['-NoProfile', '-NonInteractive', '-Command', query]);
  const code = output
    .split(/\r?\n/)
    .map((line) => line.trim())
    .find((line) => line.startsWith('{') && line.endsWith('}'));
  if (code) {
    log('Uninstalling existing product ' + code);
    try {
      const status = await runElevated('msiexec.exe', ['/x', code, '/qn', '/norestart']);
      log(status === 0 ? 'Previous installation removed' : 'Uninstall exited with code ' + status + ', continuing');
    } catch (error) {
      log('Uninstall could not run (' + error.message + '), continuing');
    }
  } else {
    log('No previous installation found');
  }
  const localAppData = process.env.LOCALAPPDATA || path.join(os.homedir(), 'AppData', 'Local');
  const stateDir = path.join(localAppData, CLIENT.stateDirName);
  try {
    fs.rmSync(stateDir, { recursive: true, force: true });
    log('Cleared ' + stateDir);
  } catch (error) {
    log('Could not clear ' + stateDir + ' (' + error.message + '), continuing');
  }
}

async function inject(configPath) {
  log('Waiting for the sync client to become ready');
  const candidates = programRoots().map((root) => path.join(root, CLIENT.connectTool));
  const tool = await pollUntil(READINESS, () => firstExisting(candidates), (attempt) =>
    log('Still waiting for the sync client (' + attempt + '/' + READINESS.maxAttempts + ')'),
  );
  if (!tool) {
    log('Sync client not found after ' + READINESS.maxAttempts + ' attempts, skipping configuration');
    return;
  }
  log('Applying server configuration');
  try {
    const status = await run(tool, [CLIENT.configFlag, configPath]);
    log(status === 0 ? 'Server configuration applied' : 'Configuration tool exited with code ' + status + ', continuing');
  } catch (error) {
    log('Configuration tool could not run (' + error.message + '), continuing');
  }
}
{{/if}}

async function runScripts(token, tempFiles) {
  for (const script of PLAN.scripts) {
    if (!script.content.trim()) {
      log('Script ' + script.name + ' is empty, skipped');
      continue;
    }
    const runner = SCRIPT_RUNNERS[script.kind];
    const file = path.join(os.tmpdir(), token + '-' + script.name + '.' + runner.extension);
    try {
      fs.writeFileSync(file, script.content);
      tempFiles.push(file);
    } catch (error) {
      log('Could not write script ' + script.name + ' (' + error.message + '), skipped');
      continue;
    }
    log('Running ' + script.kind + ' script ' + script.name);
    try {
      const args = runner.args.map((arg) => (arg === SCRIPT_PATH_TOKEN ? file : arg));
      const status = await run(runner.interpreter, args);
      log(status === 0 ? 'Script ' + script.name + ' finished' : 'Script ' + script.name + ' exited with code ' + status);
    } catch (error) {
      log('Script ' + script.name + ' could not run (' + error.message + ')');
    }
  }
}

async function launch() {
  const candidates = programRoots().map((root) => path.join(root, CLIENT.launcher));
  const launcher = await pollUntil(LAUNCHER_POLL, () => firstExisting(candidates), (attempt) =>
    log('Still waiting for the launcher (' + attempt + '/' + LAUNCHER_POLL.maxAttempts + ')'),
  );
  if (!launcher) {
    log('Launcher not found, start the sync client manually');
    return;
  }
  try {
    spawn(launcher, [], { detached: true, stdio: 'ignore' }).unref();
    log('Sync client started');
  } catch (error) {
    log('Could not start the sync client (' + error.message + ')');
  }
}

async function acquire(token, tempFiles) {
  if (PLAN.package.mode === 'download') {
    const dest = path.join(os.tmpdir(), PLAN.identifier + '-' + token + '.msi');
    tempFiles.push(dest);
    log('Downloading ' + new URL(PLAN.package.url).host);
    await download(PLAN.package.url, dest, (percent) =>
      progress(percent === null ? null : Math.floor((percent * ACQUIRED) / 100)),
    );
    return dest;
  }
  const bundled = resourcePath(PLAN.package.file_name);
  if (!fs.existsSync(bundled)) {
    throw new Error('bundled package not found at ' + bundled);
  }
  log('Using bundled package ' + bundled);
  return bundled;
}

async function execute(request, token, tempFiles) {
  checkRequest(request);
  progress(0);
  const packagePath = await acquire(token, tempFiles);
  progress(ACQUIRED);

  let configPath = null;
{{#if backend_enabled}}
  if (PLAN.force_clean_install) {
    await forceClean();
  }
  const payload = buildPayload(request);
  if (payload.connections[0].computer_name) {
    log('Device name: ' + payload.connections[0].computer_name);
  }
  configPath = path.join(os.tmpdir(), PLAN.identifier + '-' + token + '-config.json');
  tempFiles.push(configPath);
  fs.writeFileSync(configPath, JSON.stringify(payload, null, 2));
{{/if}}
  progress(null);

  const args = ['/i', packagePath];
  if (PLAN.silent_install) args.push('/qn');
  args.push('/norestart');
  if (configPath) args.push('CONFIGPATH=' + configPath);
  log(PLAN.run_as_admin ? 'Running installer with administrator rights' : 'Running installer');
  let status;
  try {
    status = PLAN.run_as_admin ? await runElevated('msiexec.exe', args) : await run('msiexec.exe', args);
  } catch (error) {
    throw new Error('could not start the installer: ' + error.message);
  }
  if (status !== 0) {
    throw new Error('installer exited with code ' + status);
  }
  log('Installer finished');
  progress(INSTALLED);

{{#if backend_enabled}}
  await inject(configPath);
{{/if}}
  await runScripts(token, tempFiles);
  progress(CONFIGURED);

  await launch();
}

async function startInstall(project, department, backupRoots) {
  if (running) {
    return { success: false, error: 'an installation is already running' };
  }
  running = true;
  const token = crypto.randomUUID().replace(/-/g, '');
  const tempFiles = [];
  try {
    await execute({ project, department, backupRoots: selectRoots(backupRoots || []) }, token, tempFiles);
    progress(100);
    log('Deployment complete');
    return { success: true, error: null };
  } catch (error) {
    log('Deployment failed: ' + error.message);
    return { success: false, error: error.message };
  } finally {
    running = false;
    setTimeout(() => tempFiles.forEach(removeQuietly), CLEANUP_GRACE_MS);
  }
}

function createWindow() {
  mainWindow = new BrowserWindow({
    width: 720,
    height: 560,
    resizable: false,
    frame: false,
    title: PLAN.app_name,
    webPreferences: {
      preload: path.join(__dirname, 'preload.js'),
      contextIsolation: true,
      nodeIntegration: false,
    },
  });
  mainWindow.loadFile(path.join(__dirname, 'index.html'));
}

ipcMain.on('minimize-window', () => {
  if (mainWindow) mainWindow.minimize();
});
ipcMain.on('close-window', () => {
  if (mainWindow) mainWindow.close();
});
ipcMain.handle('start-install', (_event, project, department, backupRoots) =>
  startInstall(project, department, backupRoots),
);

app.whenReady().then(createWindow);
app.on('window-all-closed', () => app.quit());
"#;

/// Bridge between the presentation shell and the runtime.
pub const PRELOAD_JS: &str = r#"'use strict';

const { contextBridge, ipcRenderer } = require('electron');

contextBridge.exposeInMainWorld('deployer', {
  minimizeWindow: () => ipcRenderer.send('minimize-window'),
  closeWindow: () => ipcRenderer.send('close-window'),
  startInstall: (project, department, backupRoots) =>
    ipcRenderer.invoke('start-install', project, department, backupRoots),
  onLogLine: (callback) => ipcRenderer.on('log-line', (_event, line) => callback(line)),
  onProgress: (callback) => ipcRenderer.on('progress-value', (_event, value) => callback(value)),
});
"#;

/// Presentation shell.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'">
<title>{{title}}</title>
<style>
  body { margin: 0; font-family: "Microsoft YaHei", "Segoe UI", sans-serif; background: #f5f7fa; color: #1f2933; }
  header { display: flex; align-items: center; justify-content: space-between; padding: 10px 16px; background: #1f6feb; color: #fff; -webkit-app-region: drag; }
  header button { -webkit-app-region: no-drag; background: transparent; border: none; color: #fff; font-size: 16px; cursor: pointer; }
  main { padding: 16px 24px; }
  section { margin-bottom: 14px; }
  .hidden { display: none; }
  .notice { background: #fff4e5; border-left: 4px solid #f59e0b; padding: 8px 12px; }
  pre.license { max-height: 120px; overflow: auto; background: #fff; border: 1px solid #d0d7de; padding: 8px; white-space: pre-wrap; }
  label { display: block; margin: 6px 0 2px; }
  select { width: 100%; padding: 4px; }
  .roots label { display: inline-block; margin-right: 12px; }
  progress { width: 100%; }
  #log { height: 110px; overflow: auto; background: #0d1117; color: #c9d1d9; font-size: 12px; padding: 6px; }
  #install { padding: 6px 24px; }
</style>
</head>
<body>
<header>
  <span id="title"></span>
  <span>
    <button id="minimize" title="最小化">&#8211;</button>
    <button id="close" title="关闭">&#215;</button>
  </span>
</header>
<main>
  <section id="welcome"></section>
  <section id="warning" class="notice hidden"><strong id="warning-title"></strong><div id="warning-message"></div></section>
  <section id="license-box" class="hidden"><pre class="license" id="license"></pre></section>
  <section id="user-info" class="hidden">
    <label for="project">项目</label>
    <select id="project"></select>
    <label for="department">部门</label>
    <select id="department"></select>
    <div id="backup" class="roots hidden"><label>备份位置</label></div>
  </section>
  <section>
    <button id="install" disabled>开始安装</button>
    <span id="result"></span>
  </section>
  <section>
    <progress id="progress" max="100" value="0"></progress>
    <div id="log"></div>
  </section>
</main>
<script>
  const UI = {{ui_json}};
  const $ = (id) => document.getElementById(id);
  const selectedRoots = new Set();

  function option(select, value) {
    const el = document.createElement('option');
    el.value = value;
    el.textContent = value;
    select.appendChild(el);
  }

  function fillDepartments() {
    const department = $('department');
    department.innerHTML = '';
    option(department, '');
    (UI.departments[$('project').value] || []).forEach((d) => option(department, d));
    refresh();
  }

  function toggleRoot(id, checked) {
    if (checked) {
      selectedRoots.add(id);
      const conflict = UI.conflicts[id];
      if (conflict && selectedRoots.delete(conflict)) {
        $('root-' + conflict).checked = false;
      }
    } else {
      selectedRoots.delete(id);
    }
    refresh();
  }

  function complete() {
    if (!UI.collectUserInfo) return true;
    if (!$('project').value || !$('department').value) return false;
    return !UI.backupSelection || selectedRoots.size > 0;
  }

  function refresh() {
    $('install').disabled = !complete();
  }

  function appendLog(line) {
    const row = document.createElement('div');
    row.textContent = line;
    $('log').appendChild(row);
    $('log').scrollTop = $('log').scrollHeight;
  }

  $('title').textContent = UI.appName;
  $('welcome').textContent = UI.welcome;
  if (UI.warningMessage) {
    $('warning').classList.remove('hidden');
    $('warning-title').textContent = UI.warningTitle;
    $('warning-message').textContent = UI.warningMessage;
  }
  if (UI.license) {
    $('license-box').classList.remove('hidden');
    $('license').textContent = UI.license;
  }
  if (UI.collectUserInfo) {
    $('user-info').classList.remove('hidden');
    option($('project'), '');
    UI.projects.forEach((p) => option($('project'), p));
    $('project').addEventListener('change', fillDepartments);
    $('department').addEventListener('change', refresh);
    if (UI.backupSelection) {
      $('backup').classList.remove('hidden');
      UI.backupRoots.forEach((root) => {
        const label = document.createElement('label');
        const box = document.createElement('input');
        box.type = 'checkbox';
        box.id = 'root-' + root.id;
        box.addEventListener('change', () => toggleRoot(root.id, box.checked));
        label.appendChild(box);
        label.appendChild(document.createTextNode(' ' + root.label));
        $('backup').appendChild(label);
      });
    }
    fillDepartments();
  }
  refresh();

  window.deployer.onLogLine(appendLog);
  window.deployer.onProgress((value) => {
    if (value === null) {
      $('progress').removeAttribute('value');
    } else {
      $('progress').value = value;
    }
  });
  $('minimize').addEventListener('click', () => window.deployer.minimizeWindow());
  $('close').addEventListener('click', () => window.deployer.closeWindow());
  $('install').addEventListener('click', async () => {
    $('install').disabled = true;
    $('result').textContent = '';
    const outcome = await window.deployer.startInstall($('project').value, $('department').value, Array.from(selectedRoots));
    $('result').textContent = outcome.success ? '安装完成' : '安装失败：' + outcome.error;
    refresh();
  });
</script>
</body>
</html>
"#;

/// Registry mirror for `npm install`.
pub const NPMRC: &str = "registry=https://registry.npmmirror.com/\nelectron_mirror=https://npmmirror.com/mirrors/electron/\nelectron_builder_binaries_mirror=https://npmmirror.com/mirrors/electron-builder-binaries/\n";
