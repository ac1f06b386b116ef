//! Inno Setup script template.
//!
//! Every value arrives pre-escaped for its target syntax; the template only
//! selects fragments.

pub const ISS_TEMPLATE: &str = r#"; Inno Setup 6 script for {{app_name}} {{app_version}}
; Generated by installer_genie. Compile with ISCC.exe.

[Setup]
AppId={{identifier}}
AppName={{app_name}}
AppVersion={{app_version}}
AppPublisher={{publisher}}
VersionInfoVersion={{version_info}}
VersionInfoProductName={{app_name}}
CreateAppDir=no
Uninstallable=no
DisableProgramGroupPage=yes
DisableWelcomePage={{disable_welcome_page}}
DisableReadyPage=no
PrivilegesRequired={{privileges}}
OutputDir=Output
OutputBaseFilename={{output_base}}
Compression=lzma2
SolidCompression=yes
WizardStyle=modern
ShowLanguageDialog=no
CloseApplications=yes
SetupLogging=yes

[Languages]
Name: "chinesesimplified"; MessagesFile: "compiler:Languages\ChineseSimplified.isl"
Name: "english"; MessagesFile: "compiler:Default.isl"
{{#unless online}}

[Files]
Source: "{{package_source}}"; DestDir: "{tmp}"; DestName: "Setup.msi"
{{/unless}}
{{#if scripts}}

[Run]
{{#each scripts}}
Filename: "{{this.interpreter}}"; Parameters: "{{this.parameters}}"; StatusMsg: "{{this.status}}"; Flags: runhidden waituntilterminated
{{/each}}
{{/if}}

[Code]
const
  ClientDisplayName = {{client_display_name}};
  ClientStateDir = {{client_state_dir}};
  ConfigFileName = 'config.json';

var
  PackagePath: String;
{{#if online}}
  DownloadPage: TDownloadWizardPage;
{{/if}}
{{#if has_warning}}
  WarningPage: TOutputMsgWizardPage;
{{/if}}
{{#if has_license}}
  LicensePage: TOutputMsgMemoWizardPage;
{{/if}}
{{#if collect_user_info}}
  UserInfoPage: TWizardPage;
  ProjectCombo: TNewComboBox;
  DepartmentCombo: TNewComboBox;
{{/if}}
{{#if backup_enabled}}
  BackupList: TNewCheckListBox;
{{/if}}

function JsonEscape(Value: String): String;
begin
  Result := Value;
  StringChangeEx(Result, '\', '\\', True);
  StringChangeEx(Result, '"', '\"', True);
end;
{{#if collect_user_info}}

procedure FillDepartments(Project: String);
begin
  DepartmentCombo.Items.Clear;
  if Project = '' then
    Exit;
{{#each department_overrides}}
  if Project = {{this.project}} then
  begin
{{#each this.departments}}
    DepartmentCombo.Items.Add({{this}});
{{/each}}
    Exit;
  end;
{{/each}}
{{#each fallback_departments}}
  DepartmentCombo.Items.Add({{this}});
{{/each}}
end;
{{#if backup_enabled}}

function BackupPathJson(Index: Integer): String;
begin
  case Index of
{{#each backup_roots}}
    {{@index}}: Result := {{this.path_json}};
{{/each}}
  else
    Result := '';
  end;
end;

function SelectedBackupPathsJson: String;
var
  I: Integer;
begin
  Result := '';
  for I := 0 to BackupList.Items.Count - 1 do
    if BackupList.Checked[I] then
    begin
      if Result <> '' then
        Result := Result + ',';
      Result := Result + BackupPathJson(I);
    end;
end;

function SelectedBackupLabels: String;
var
  I: Integer;
begin
  Result := '';
  for I := 0 to BackupList.Items.Count - 1 do
    if BackupList.Checked[I] then
    begin
      if Result <> '' then
        Result := Result + ', ';
      Result := Result + BackupList.ItemCaption[I];
    end;
end;
{{/if}}

function UserInfoComplete: Boolean;
{{#if backup_enabled}}
var
  I: Integer;
  AnyChecked: Boolean;
{{/if}}
begin
  Result := (ProjectCombo.ItemIndex >= 0) and (DepartmentCombo.ItemIndex >= 0);
{{#if backup_enabled}}
  AnyChecked := False;
  for I := 0 to BackupList.Items.Count - 1 do
    if BackupList.Checked[I] then
      AnyChecked := True;
  Result := Result and AnyChecked;
{{/if}}
end;

procedure UpdateNextButton;
begin
  if WizardForm.CurPageID = UserInfoPage.ID then
    WizardForm.NextButton.Enabled := UserInfoComplete;
end;

procedure ProjectChange(Sender: TObject);
begin
  FillDepartments(ProjectCombo.Text);
  UpdateNextButton;
end;

procedure DepartmentChange(Sender: TObject);
begin
  UpdateNextButton;
end;
{{#if backup_enabled}}

procedure BackupClickCheck(Sender: TObject);
begin
  if (BackupList.ItemIndex = {{c_index}}) and BackupList.Checked[{{c_index}}] then
    BackupList.Checked[{{desktop_index}}] := False;
  if (BackupList.ItemIndex = {{desktop_index}}) and BackupList.Checked[{{desktop_index}}] then
    BackupList.Checked[{{c_index}}] := False;
  UpdateNextButton;
end;
{{/if}}
{{/if}}
{{#if backend_enabled}}

function BuildConfigJson: String;
begin
  Result := '{"connections":[' + {{connection_prefix}};
{{#if device_naming}}
  Result := Result + ',"computer_name":"' + JsonEscape(ProjectCombo.Text + '-' + DepartmentCombo.Text + '-' + GetComputerNameString) + '"';
{{/if}}
  Result := Result + '}]';
{{#if backup_enabled}}
  Result := Result + ',"backup_path":[' + SelectedBackupPathsJson + ']';
{{/if}}
  Result := Result + {{policy_tail}} + '}';
end;
{{/if}}
{{#if force_clean}}

procedure UninstallFrom(RootKey: Integer; SubKey: String);
var
  Names: TArrayOfString;
  I, ResultCode: Integer;
  DisplayName: String;
begin
  if not RegGetSubkeyNames(RootKey, SubKey, Names) then
    Exit;
  for I := 0 to GetArrayLength(Names) - 1 do
    if RegQueryStringValue(RootKey, SubKey + '\' + Names[I], 'DisplayName', DisplayName) and
       (Pos(ClientDisplayName, DisplayName) = 1) then
    begin
      Log('Uninstalling ' + DisplayName + ' ' + Names[I]);
      Exec('msiexec.exe', '/x ' + Names[I] + ' /qn /norestart', '', SW_HIDE, ewWaitUntilTerminated, ResultCode);
    end;
end;

procedure CleanPreviousInstall;
begin
  UninstallFrom(HKLM, 'Software\Microsoft\Windows\CurrentVersion\Uninstall');
  UninstallFrom(HKLM, 'Software\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall');
  DelTree(ExpandConstant('{localappdata}') + '\' + ClientStateDir, True, True, True);
end;
{{/if}}
{{#if scripts}}

procedure WriteAutomationScripts;
begin
{{#each scripts}}
  SaveStringToFile(ExpandConstant('{tmp}') + '\' + {{this.file_name}}, Utf8Encode({{this.content}}), False);
{{/each}}
end;
{{/if}}

procedure InitializeWizard;
var
  AfterID: Integer;
{{#if collect_user_info}}
  ProjectLabel: TNewStaticText;
  DepartmentLabel: TNewStaticText;
{{/if}}
{{#if backup_enabled}}
  BackupLabel: TNewStaticText;
{{/if}}
begin
  WizardForm.WelcomeLabel2.Caption := {{welcome}};
  AfterID := wpWelcome;
{{#if has_warning}}
  WarningPage := CreateOutputMsgPage(AfterID, {{warning_title}}, '', {{warning_message}});
  AfterID := WarningPage.ID;
{{/if}}
{{#if has_license}}
  LicensePage := CreateOutputMsgMemoPage(AfterID, '许可协议', '请仔细阅读以下许可协议。', '', {{license}});
  AfterID := LicensePage.ID;
{{/if}}
{{#if collect_user_info}}
  UserInfoPage := CreateCustomPage(AfterID, '用户信息', '请选择您所在的项目和部门。');

  ProjectLabel := TNewStaticText.Create(UserInfoPage);
  ProjectLabel.Parent := UserInfoPage.Surface;
  ProjectLabel.Caption := '项目：';
  ProjectLabel.Top := 0;

  ProjectCombo := TNewComboBox.Create(UserInfoPage);
  ProjectCombo.Parent := UserInfoPage.Surface;
  ProjectCombo.Style := csDropDownList;
  ProjectCombo.Top := ProjectLabel.Top + ProjectLabel.Height + ScaleY(4);
  ProjectCombo.Width := UserInfoPage.SurfaceWidth;
{{#each projects}}
  ProjectCombo.Items.Add({{this}});
{{/each}}
  ProjectCombo.OnChange := @ProjectChange;

  DepartmentLabel := TNewStaticText.Create(UserInfoPage);
  DepartmentLabel.Parent := UserInfoPage.Surface;
  DepartmentLabel.Caption := '部门：';
  DepartmentLabel.Top := ProjectCombo.Top + ProjectCombo.Height + ScaleY(12);

  DepartmentCombo := TNewComboBox.Create(UserInfoPage);
  DepartmentCombo.Parent := UserInfoPage.Surface;
  DepartmentCombo.Style := csDropDownList;
  DepartmentCombo.Top := DepartmentLabel.Top + DepartmentLabel.Height + ScaleY(4);
  DepartmentCombo.Width := UserInfoPage.SurfaceWidth;
  DepartmentCombo.OnChange := @DepartmentChange;
{{#if backup_enabled}}

  BackupLabel := TNewStaticText.Create(UserInfoPage);
  BackupLabel.Parent := UserInfoPage.Surface;
  BackupLabel.Caption := '备份位置：';
  BackupLabel.Top := DepartmentCombo.Top + DepartmentCombo.Height + ScaleY(12);

  BackupList := TNewCheckListBox.Create(UserInfoPage);
  BackupList.Parent := UserInfoPage.Surface;
  BackupList.Top := BackupLabel.Top + BackupLabel.Height + ScaleY(4);
  BackupList.Width := UserInfoPage.SurfaceWidth;
  BackupList.Height := ScaleY(110);
{{#each backup_roots}}
  BackupList.AddCheckBox({{this.label}}, '', 0, False, True, False, True, nil);
{{/each}}
  BackupList.OnClickCheck := @BackupClickCheck;
{{/if}}
{{/if}}
{{#if online}}

  DownloadPage := CreateDownloadPage(SetupMessage(msgWizardPreparing), SetupMessage(msgPreparingDesc), nil);
{{/if}}
end;

procedure CurPageChanged(CurPageID: Integer);
begin
{{#if collect_user_info}}
  if CurPageID = UserInfoPage.ID then
    WizardForm.NextButton.Enabled := UserInfoComplete;
{{/if}}
end;

function NextButtonClick(CurPageID: Integer): Boolean;
begin
  Result := True;
{{#if collect_user_info}}
  if (CurPageID = UserInfoPage.ID) and not UserInfoComplete then
  begin
    MsgBox({{incomplete_message}}, mbError, MB_OK);
    Result := False;
    Exit;
  end;
{{/if}}
{{#if online}}
  if CurPageID = wpReady then
  begin
    DownloadPage.Clear;
    DownloadPage.Add({{download_url}}, 'Setup.msi', '');
    DownloadPage.Show;
    try
      try
        DownloadPage.Download;
      except
        if DownloadPage.AbortedByUser then
          Log('Download aborted by user.')
        else
          SuppressibleMsgBox(AddPeriod(GetExceptionMessage), mbCriticalError, MB_OK, IDOK);
        Result := False;
      end;
    finally
      DownloadPage.Hide;
    end;
  end;
{{/if}}
end;

function UpdateReadyMemo(Space, NewLine, MemoUserInfoInfo, MemoDirInfo, MemoTypeInfo, MemoComponentsInfo, MemoGroupInfo, MemoTasksInfo: String): String;
begin
  Result := {{memo_title}};
{{#if collect_user_info}}
  Result := Result + NewLine + NewLine + '项目：' + ProjectCombo.Text;
  Result := Result + NewLine + '部门：' + DepartmentCombo.Text;
{{#if backup_enabled}}
  Result := Result + NewLine + '备份位置：' + SelectedBackupLabels;
{{/if}}
{{/if}}
{{#if backend_enabled}}
  Result := Result + NewLine + '服务器：' + {{server_address}};
{{/if}}
end;

procedure CurStepChanged(CurStep: TSetupStep);
var
  ResultCode: Integer;
  Params: String;
begin
  if CurStep <> ssInstall then
    Exit;
{{#if force_clean}}
  CleanPreviousInstall;
{{/if}}
  PackagePath := ExpandConstant('{tmp}') + '\Setup.msi';
  Params := '/i "' + PackagePath + '"' + {{msi_quiet}} + ' /norestart';
{{#if backend_enabled}}
  SaveStringToFile(ExpandConstant('{tmp}') + '\' + ConfigFileName, Utf8Encode(BuildConfigJson), False);
  Params := Params + ' CONFIGPATH="' + ExpandConstant('{tmp}') + '\' + ConfigFileName + '"';
{{/if}}
  Log('Running msiexec.exe ' + Params);
  if not Exec('msiexec.exe', Params, '', SW_SHOW, ewWaitUntilTerminated, ResultCode) or (ResultCode <> 0) then
  begin
    SuppressibleMsgBox('安装程序执行失败，错误代码：' + IntToStr(ResultCode), mbCriticalError, MB_OK, IDOK);
    Abort;
  end;
{{#if scripts}}
  WriteAutomationScripts;
{{/if}}
end;
"#;
